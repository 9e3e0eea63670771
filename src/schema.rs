use serde::{Deserialize, Serialize};

/// A validated bank transaction from an uploaded statement.
///
/// `date` is kept as written in the file; only the amount is interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: String,
    pub description: String,
    /// Positive for money in, negative for money out.
    pub amount: f64,
}

impl Transaction {
    pub fn new(date: impl Into<String>, description: impl Into<String>, amount: f64) -> Self {
        Self {
            date: date.into(),
            description: description.into(),
            amount,
        }
    }

    pub fn is_income(&self) -> bool {
        self.amount > 0.0
    }

    pub fn is_expense(&self) -> bool {
        self.amount < 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TransactionSummary {
    pub count: usize,
    pub total_income: f64,
    /// Absolute value of all outgoing amounts.
    pub total_expenses: f64,
}

impl TransactionSummary {
    pub fn net(&self) -> f64 {
        self.total_income - self.total_expenses
    }
}
