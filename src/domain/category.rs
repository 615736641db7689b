/// The fixed expense category vocabulary. Transactions store the category as
/// a plain label so imported or scanned data never fails on an unknown
/// string, but UI surfaces and validation draw from this list.
pub const EXPENSE_CATEGORIES: &[&str] = &[
    "housing",
    "transportation",
    "groceries",
    "utilities",
    "entertainment",
    "food",
    "shopping",
    "healthcare",
    "education",
    "personal",
    "travel",
    "insurance",
    "gifts",
    "bills",
    "other-expense",
];

pub const INCOME_CATEGORIES: &[&str] = &[
    "salary",
    "freelance",
    "investments",
    "business",
    "rental",
    "other-income",
];

pub fn is_known_expense_category(label: &str) -> bool {
    EXPENSE_CATEGORIES.contains(&label)
}

pub fn is_known_income_category(label: &str) -> bool {
    INCOME_CATEGORIES.contains(&label)
}
