use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use bank_core::records::{
    AccountRecord, AccountStatus, AccountType, Branch, CustomerRecord, LoanStatus,
};
use chrono::NaiveDate;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::context::GeneratorContext;
use crate::dates::{
    birth_date_window, date_joined_window, opening_date_window, random_date,
};
use crate::error::GeneratorError;
use crate::text_provider::{flatten_address, TextProvider};

pub const CREDIT_SCORE_MIN: i64 = 300;
pub const CREDIT_SCORE_MAX: i64 = 900;

/// Non-negative number of customers to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordCount(usize);

impl RecordCount {
    pub fn new(count: usize) -> Self {
        Self(count)
    }

    pub fn get(self) -> usize {
        self.0
    }
}

impl TryFrom<i64> for RecordCount {
    type Error = GeneratorError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        usize::try_from(value).map(Self).map_err(|_| {
            GeneratorError::InvalidArgument(format!(
                "record count must be a non-negative integer, got {value}"
            ))
        })
    }
}

impl FromStr for RecordCount {
    type Err = GeneratorError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let parsed: i64 = value.trim().parse().map_err(|_| {
            GeneratorError::InvalidArgument(format!(
                "record count must be a non-negative integer, got '{value}'"
            ))
        })?;
        Self::try_from(parsed)
    }
}

impl fmt::Display for RecordCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How many accounts each customer receives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AccountsPerCustomer {
    /// Exactly one account per customer, in customer order.
    #[default]
    One,
    /// Uniform count in `min..=max` per customer.
    Between { min: usize, max: usize },
}

impl AccountsPerCustomer {
    pub fn validate(self) -> Result<Self, GeneratorError> {
        match self {
            Self::Between { min, max } if min > max => Err(GeneratorError::InvalidArgument(
                format!("accounts per customer range {min}..={max} is empty"),
            )),
            _ => Ok(self),
        }
    }

    fn sample<R: Rng + ?Sized>(self, rng: &mut R) -> usize {
        match self {
            Self::One => 1,
            Self::Between { min, max } => rng.gen_range(min..=max),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    pub customers: Vec<CustomerRecord>,
    pub accounts: Vec<AccountRecord>,
}

pub fn customer_id(position: usize) -> String {
    format!("CUST-{:04}", position + 1)
}

fn pick<T: Copy, R: Rng + ?Sized>(rng: &mut R, values: &[T]) -> T {
    *values
        .choose(rng)
        .expect("enumerated value sets are never empty")
}

/// `count` customers; position `i` always receives `CUST-{i+1:04}`.
pub fn generate_customers<R, P>(
    count: RecordCount,
    today: NaiveDate,
    rng: &mut R,
    text: &mut P,
) -> Vec<CustomerRecord>
where
    R: Rng + ?Sized,
    P: TextProvider + ?Sized,
{
    let birth_window = birth_date_window(today);
    let joined_window = date_joined_window();

    (0..count.get())
        .map(|position| {
            let name = text.next_name();
            let credit_score = rng.gen_range(CREDIT_SCORE_MIN..=CREDIT_SCORE_MAX);
            let loan_status = pick(rng, &LoanStatus::ALL);
            let date_of_birth = random_date(rng, birth_window);
            let date_joined = random_date(rng, joined_window);
            let address = flatten_address(&text.next_address());
            let phone_number = text.next_phone();
            let email = text.next_email(&name);

            CustomerRecord {
                customer_id: customer_id(position),
                name,
                credit_score,
                loan_status,
                date_of_birth,
                date_joined,
                address,
                phone_number,
                email,
            }
        })
        .collect()
}

/// One account per customer, in customer order.
pub fn generate_accounts<R: Rng + ?Sized>(
    customers: &[CustomerRecord],
    rng: &mut R,
) -> Vec<AccountRecord> {
    sample_accounts(customers, AccountsPerCustomer::One, rng)
}

/// Rejects an empty `Between` range before drawing anything.
pub fn generate_accounts_with_policy<R: Rng + ?Sized>(
    customers: &[CustomerRecord],
    policy: AccountsPerCustomer,
    rng: &mut R,
) -> Result<Vec<AccountRecord>, GeneratorError> {
    let policy = policy.validate()?;
    Ok(sample_accounts(customers, policy, rng))
}

fn sample_accounts<R: Rng + ?Sized>(
    customers: &[CustomerRecord],
    policy: AccountsPerCustomer,
    rng: &mut R,
) -> Vec<AccountRecord> {
    let opening_window = opening_date_window();
    let mut issued_ids = HashSet::with_capacity(customers.len());
    let mut accounts = Vec::with_capacity(customers.len());

    for customer in customers {
        for _ in 0..policy.sample(rng) {
            let account_id = next_account_id(rng, &mut issued_ids);
            accounts.push(AccountRecord {
                account_id,
                customer_id: customer.customer_id.clone(),
                account_type: pick(rng, &AccountType::ALL),
                opening_date: random_date(rng, opening_window),
                branch: pick(rng, &Branch::ALL),
                account_status: pick(rng, &AccountStatus::ALL),
            });
        }
    }

    accounts
}

/// `ACC-` plus the first 8 hex digits of a random v4 UUID, unique per batch.
fn next_account_id<R: Rng + ?Sized>(rng: &mut R, issued: &mut HashSet<String>) -> String {
    loop {
        let uuid = uuid::Builder::from_random_bytes(rng.gen()).into_uuid();
        let hex = uuid.simple().to_string();
        let candidate = format!("ACC-{}", hex[..8].to_ascii_uppercase());
        if issued.insert(candidate.clone()) {
            return candidate;
        }
    }
}

pub fn generate_dataset(
    ctx: &GeneratorContext,
    count: RecordCount,
    policy: AccountsPerCustomer,
) -> Result<Dataset, GeneratorError> {
    let policy = policy.validate()?;
    let mut rng = ctx.record_rng();
    let mut text = ctx.text_provider();

    let customers = generate_customers(count, ctx.run_date, &mut rng, &mut text);
    let accounts = sample_accounts(&customers, policy, &mut rng);

    tracing::info!(
        component = "generator",
        event = "dataset_generated",
        seed = ctx.seed,
        run_date = %ctx.run_date,
        customers = customers.len(),
        accounts = accounts.len(),
    );

    Ok(Dataset {
        customers,
        accounts,
    })
}
