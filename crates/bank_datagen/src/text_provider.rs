//! Random free-text fields (names, addresses, phone numbers, emails).
//!
//! Generation code only sees the [`TextProvider`] capability, so the word
//! lists below can be swapped for a scripted double in tests.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

pub const PHONE_PREFIX: &str = "+91 ";
pub const EMAIL_DOMAINS: [&str; 5] = [
    "gmail.com",
    "yahoo.com",
    "outlook.com",
    "rediffmail.com",
    "hotmail.com",
];

pub trait TextProvider {
    fn next_name(&mut self) -> String;

    /// May span several lines; callers flatten it before storage.
    fn next_address(&mut self) -> String;

    fn next_phone(&mut self) -> String;

    fn next_email(&mut self, name: &str) -> String;
}

/// Lower-cased first two name tokens, concatenated.
pub fn email_local_part(name: &str) -> String {
    name.split_whitespace()
        .take(2)
        .map(str::to_lowercase)
        .collect()
}

pub fn flatten_address(address: &str) -> String {
    address
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

const FIRST_NAMES: [&str; 40] = [
    "Aarav", "Vivaan", "Aditya", "Vihaan", "Arjun", "Sai", "Reyansh", "Ayaan", "Krishna",
    "Ishaan", "Shaurya", "Atharv", "Kabir", "Rohan", "Rahul", "Vikram", "Anil", "Suresh",
    "Rajesh", "Manoj", "Aadhya", "Ananya", "Diya", "Saanvi", "Pari", "Anika", "Navya",
    "Myra", "Kavya", "Ishita", "Priya", "Neha", "Pooja", "Sneha", "Lakshmi", "Meera",
    "Asha", "Sunita", "Nisha", "Tara",
];

const LAST_NAMES: [&str; 30] = [
    "Sharma", "Verma", "Gupta", "Mehta", "Patel", "Shah", "Iyer", "Nair", "Menon", "Reddy",
    "Rao", "Naidu", "Pillai", "Chopra", "Kapoor", "Malhotra", "Bose", "Banerjee",
    "Chatterjee", "Mukherjee", "Das", "Ghosh", "Singh", "Kaur", "Gill", "Sandhu", "Joshi",
    "Kulkarni", "Deshpande", "Agarwal",
];

const NAME_PREFIXES: [&str; 3] = ["Dr.", "Mr.", "Ms."];

const STREETS: [&str; 16] = [
    "MG Road", "Nehru Nagar", "Gandhi Chowk", "Tilak Marg", "Lal Bagh Road",
    "Park Street", "Marine Drive", "Anna Salai", "Brigade Road", "Linking Road",
    "Ashok Vihar", "Civil Lines", "Rajaji Path", "Shastri Nagar", "Patel Ganj",
    "Banjara Hills",
];

const CITIES: [(&str, u32); 12] = [
    ("Mumbai", 400),
    ("Delhi", 110),
    ("Bangalore", 560),
    ("Chennai", 600),
    ("Kolkata", 700),
    ("Hyderabad", 500),
    ("Pune", 411),
    ("Ahmedabad", 380),
    ("Jaipur", 302),
    ("Lucknow", 226),
    ("Kochi", 682),
    ("Bhopal", 462),
];

/// Indian-locale text drawn from fixed word lists with a seeded RNG.
#[derive(Debug, Clone)]
pub struct SeededTextProvider {
    rng: StdRng,
}

impl SeededTextProvider {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn pick<'a>(&mut self, values: &'a [&'a str]) -> &'a str {
        values.choose(&mut self.rng).copied().unwrap_or_default()
    }
}

impl TextProvider for SeededTextProvider {
    fn next_name(&mut self) -> String {
        let first = self.pick(&FIRST_NAMES);
        let last = self.pick(&LAST_NAMES);
        if self.rng.gen_ratio(1, 10) {
            let prefix = self.pick(&NAME_PREFIXES);
            format!("{prefix} {first} {last}")
        } else {
            format!("{first} {last}")
        }
    }

    fn next_address(&mut self) -> String {
        let house = self.rng.gen_range(1..=999);
        let street = self.pick(&STREETS);
        let (city, pin_prefix) = CITIES
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(("Mumbai", 400));
        let pin_suffix = self.rng.gen_range(1..=99);
        format!("H.No. {house}\n{street}\n{city} {pin_prefix}{pin_suffix:03}")
    }

    fn next_phone(&mut self) -> String {
        let digits: String = (0..10)
            .map(|_| char::from(b'0' + self.rng.gen_range(0..10u8)))
            .collect();
        format!("{PHONE_PREFIX}{digits}")
    }

    fn next_email(&mut self, name: &str) -> String {
        let suffix = self.rng.gen_range(1..=9999);
        let domain = self.pick(&EMAIL_DOMAINS);
        format!("{}{suffix}@{domain}", email_local_part(name))
    }
}
