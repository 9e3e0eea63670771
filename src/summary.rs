use crate::schema::{Transaction, TransactionSummary};

/// Totals income and expenses across `records`.
///
/// Zero amounts count towards `count` but neither total.
pub fn summarize(records: &[Transaction]) -> TransactionSummary {
    let mut summary = TransactionSummary {
        count: records.len(),
        ..Default::default()
    };

    let mut outgoing = 0.0;
    for record in records {
        if record.is_income() {
            summary.total_income += record.amount;
        } else if record.is_expense() {
            outgoing += record.amount;
        }
    }
    summary.total_expenses = outgoing.abs();

    summary
}

/// The sentence prepended to a prompt so the model can see the uploaded data.
pub fn context_sentence(summary: &TransactionSummary) -> String {
    format!(
        "I have uploaded {} transactions. My total income is ${:.2} and my total expenses are ${:.2}.",
        summary.count, summary.total_income, summary.total_expenses
    )
}

/// Builds the text actually sent to the model for `user_text`.
///
/// With no records loaded this is the user's text unchanged.
pub fn build_prompt(user_text: &str, records: &[Transaction]) -> String {
    if records.is_empty() {
        return user_text.to_string();
    }

    let summary = summarize(records);
    format!("{} {}", context_sentence(&summary), user_text)
}
