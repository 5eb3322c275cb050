use std::collections::VecDeque;

use bank_datagen::{generate_customers, RecordCount, TextProvider};
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Replays fixed names and addresses so text fields are fully predictable.
struct ScriptedTextProvider {
    names: VecDeque<&'static str>,
    addresses: VecDeque<&'static str>,
    emails_requested: Vec<String>,
}

impl ScriptedTextProvider {
    fn new(names: &[&'static str], addresses: &[&'static str]) -> Self {
        Self {
            names: names.iter().copied().collect(),
            addresses: addresses.iter().copied().collect(),
            emails_requested: Vec::new(),
        }
    }
}

impl TextProvider for ScriptedTextProvider {
    fn next_name(&mut self) -> String {
        self.names.pop_front().expect("script has a name").to_string()
    }

    fn next_address(&mut self) -> String {
        self.addresses
            .pop_front()
            .expect("script has an address")
            .to_string()
    }

    fn next_phone(&mut self) -> String {
        "+91 9876543210".to_string()
    }

    fn next_email(&mut self, name: &str) -> String {
        self.emails_requested.push(name.to_string());
        format!("{}@example.test", name.to_lowercase().replace(' ', "."))
    }
}

#[test]
fn generator_uses_text_provider_for_every_free_text_field() {
    let mut text = ScriptedTextProvider::new(
        &["Asha Rao", "Vikram Singh Gill"],
        &["12 MG Road\nPune 411001", "Flat 4, Civil Lines\n\nJaipur 302001"],
    );
    let mut rng = StdRng::seed_from_u64(8);
    let today = NaiveDate::from_ymd_opt(2026, 2, 14).expect("valid date");

    let customers = generate_customers(RecordCount::new(2), today, &mut rng, &mut text);

    assert_eq!(customers[0].name, "Asha Rao");
    assert_eq!(customers[0].address, "12 MG Road, Pune 411001");
    assert_eq!(customers[0].email, "asha.rao@example.test");
    assert_eq!(customers[1].address, "Flat 4, Civil Lines, Jaipur 302001");
    assert_eq!(customers[1].phone_number, "+91 9876543210");
    assert_eq!(text.emails_requested, vec!["Asha Rao", "Vikram Singh Gill"]);
}

#[test]
fn numeric_fields_do_not_depend_on_text_provider() {
    let today = NaiveDate::from_ymd_opt(2026, 2, 14).expect("valid date");
    let mut first = ScriptedTextProvider::new(&["A B", "C D"], &["x", "y"]);
    let mut second = ScriptedTextProvider::new(&["E F", "G H"], &["z", "w"]);

    let a = generate_customers(
        RecordCount::new(2),
        today,
        &mut StdRng::seed_from_u64(21),
        &mut first,
    );
    let b = generate_customers(
        RecordCount::new(2),
        today,
        &mut StdRng::seed_from_u64(21),
        &mut second,
    );

    for (left, right) in a.iter().zip(&b) {
        assert_eq!(left.credit_score, right.credit_score);
        assert_eq!(left.loan_status, right.loan_status);
        assert_eq!(left.date_of_birth, right.date_of_birth);
        assert_eq!(left.date_joined, right.date_joined);
    }
}
