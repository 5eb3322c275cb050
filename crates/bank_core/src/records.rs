use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub const CUSTOMER_COLUMNS: [&str; 9] = [
    "Customer_ID",
    "Name",
    "Credit_Score",
    "Loan_Status",
    "Date_of_Birth",
    "Date_Joined",
    "Address",
    "Phone_Number",
    "Email",
];

pub const ACCOUNT_COLUMNS: [&str; 6] = [
    "Account_ID",
    "Customer_ID",
    "Account_Type",
    "Opening_Date",
    "Branch",
    "Account_Status",
];

/// Column order of the denormalized `cust_acc` table produced by the join.
pub const CUST_ACC_COLUMNS: [&str; 14] = [
    "Account_ID",
    "Customer_ID",
    "Account_Type",
    "Opening_Date",
    "Branch",
    "Account_Status",
    "Name",
    "Credit_Score",
    "Loan_Status",
    "Date_of_Birth",
    "Date_Joined",
    "Address",
    "Phone_Number",
    "Email",
];

/// A row type that serializes to a fixed, ordered list of CSV columns.
pub trait TableRecord: Serialize + DeserializeOwned {
    const COLUMNS: &'static [&'static str];
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum LoanStatus {
    Approved,
    Pending,
    Rejected,
    #[serde(rename = "Not Applied")]
    NotApplied,
}

impl LoanStatus {
    pub const ALL: [Self; 4] = [
        Self::Approved,
        Self::Pending,
        Self::Rejected,
        Self::NotApplied,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Approved => "Approved",
            Self::Pending => "Pending",
            Self::Rejected => "Rejected",
            Self::NotApplied => "Not Applied",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AccountType {
    Savings,
    Current,
    #[serde(rename = "Fixed Deposit")]
    FixedDeposit,
    #[serde(rename = "Salary Account")]
    SalaryAccount,
    #[serde(rename = "Recurring deposit account")]
    RecurringDeposit,
}

impl AccountType {
    pub const ALL: [Self; 5] = [
        Self::Savings,
        Self::Current,
        Self::FixedDeposit,
        Self::SalaryAccount,
        Self::RecurringDeposit,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Savings => "Savings",
            Self::Current => "Current",
            Self::FixedDeposit => "Fixed Deposit",
            Self::SalaryAccount => "Salary Account",
            Self::RecurringDeposit => "Recurring deposit account",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Branch {
    Mumbai,
    Delhi,
    Bangalore,
    Chennai,
    Kolkata,
    Hyderabad,
}

impl Branch {
    pub const ALL: [Self; 6] = [
        Self::Mumbai,
        Self::Delhi,
        Self::Bangalore,
        Self::Chennai,
        Self::Kolkata,
        Self::Hyderabad,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mumbai => "Mumbai",
            Self::Delhi => "Delhi",
            Self::Bangalore => "Bangalore",
            Self::Chennai => "Chennai",
            Self::Kolkata => "Kolkata",
            Self::Hyderabad => "Hyderabad",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AccountStatus {
    Active,
    Inactive,
    Closed,
}

impl AccountStatus {
    pub const ALL: [Self; 3] = [Self::Active, Self::Inactive, Self::Closed];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Inactive => "Inactive",
            Self::Closed => "Closed",
        }
    }
}

/// One synthetic bank customer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CustomerRecord {
    #[serde(rename = "Customer_ID")]
    pub customer_id: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Credit_Score")]
    pub credit_score: i64,
    #[serde(rename = "Loan_Status")]
    pub loan_status: LoanStatus,
    #[serde(rename = "Date_of_Birth")]
    pub date_of_birth: NaiveDate,
    #[serde(rename = "Date_Joined")]
    pub date_joined: NaiveDate,
    #[serde(rename = "Address")]
    pub address: String,
    #[serde(rename = "Phone_Number")]
    pub phone_number: String,
    #[serde(rename = "Email")]
    pub email: String,
}

impl TableRecord for CustomerRecord {
    const COLUMNS: &'static [&'static str] = &CUSTOMER_COLUMNS;
}

/// One account, linked to exactly one customer through `customer_id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountRecord {
    #[serde(rename = "Account_ID")]
    pub account_id: String,
    #[serde(rename = "Customer_ID")]
    pub customer_id: String,
    #[serde(rename = "Account_Type")]
    pub account_type: AccountType,
    #[serde(rename = "Opening_Date")]
    pub opening_date: NaiveDate,
    #[serde(rename = "Branch")]
    pub branch: Branch,
    #[serde(rename = "Account_Status")]
    pub account_status: AccountStatus,
}

impl TableRecord for AccountRecord {
    const COLUMNS: &'static [&'static str] = &ACCOUNT_COLUMNS;
}
