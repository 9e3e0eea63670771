use crate::schema::Transaction;
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

pub const NO_TRANSACTIONS_PLACEHOLDER: &str = "No transactions loaded";

fn bold_pattern() -> &'static Regex {
    static BOLD: OnceLock<Regex> = OnceLock::new();
    BOLD.get_or_init(|| Regex::new(r"\*\*(.*?)\*\*").expect("bold pattern is valid"))
}

/// Converts model text into the inline markup shown in the conversation.
///
/// Only two rules apply: `**span**` becomes `<strong>span</strong>` and each
/// newline becomes `<br>`. Emphasis does not cross line breaks. An unclosed
/// `**` is left as-is, so re-rendering a growing buffer picks the span up once
/// its closing marker arrives.
pub fn format_response(text: &str) -> String {
    bold_pattern()
        .replace_all(text, "<strong>$1</strong>")
        .replace('\n', "<br>")
}

/// en-US currency text: `$1,234.56`, `-$42.50`.
pub fn format_currency(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{}${}.{}", sign, grouped, cents)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AmountClass {
    Positive,
    Negative,
}

impl AmountClass {
    pub fn of(amount: f64) -> Self {
        if amount < 0.0 {
            AmountClass::Negative
        } else {
            AmountClass::Positive
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            AmountClass::Positive => "positive",
            AmountClass::Negative => "negative",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionRow {
    pub date: String,
    pub description: String,
    pub amount: String,
    pub class: AmountClass,
}

impl From<&Transaction> for TransactionRow {
    fn from(tx: &Transaction) -> Self {
        Self {
            date: tx.date.clone(),
            description: tx.description.clone(),
            amount: format_currency(tx.amount),
            class: AmountClass::of(tx.amount),
        }
    }
}

/// What the transaction viewer displays.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TransactionTable {
    Empty,
    Rows(Vec<TransactionRow>),
}

impl TransactionTable {
    pub fn len(&self) -> usize {
        match self {
            TransactionTable::Empty => 0,
            TransactionTable::Rows(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn transaction_table(records: &[Transaction]) -> TransactionTable {
    if records.is_empty() {
        return TransactionTable::Empty;
    }
    TransactionTable::Rows(records.iter().map(TransactionRow::from).collect())
}
