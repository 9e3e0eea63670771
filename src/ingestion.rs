use crate::schema::Transaction;
use log::debug;

/// Parses a `date,description,amount` statement export.
///
/// The first line is treated as a header and always skipped. Fields are split
/// on bare commas with no quoting support, so a description containing a
/// comma shifts the amount column and the row is dropped. Rows missing a date
/// or description, or whose amount is not a finite number, are dropped
/// silently. Order is preserved.
pub fn parse_transactions(raw: &str) -> Vec<Transaction> {
    let mut transactions = Vec::new();
    let mut dropped = 0usize;

    for line in raw.lines().skip(1) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match parse_row(line) {
            Some(tx) => transactions.push(tx),
            None => dropped += 1,
        }
    }

    debug!(
        "Parsed {} transactions ({} malformed rows dropped)",
        transactions.len(),
        dropped
    );

    transactions
}

fn parse_row(line: &str) -> Option<Transaction> {
    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() < 3 {
        return None;
    }

    let date = fields[0].trim();
    let description = fields[1].trim();
    if date.is_empty() || description.is_empty() {
        return None;
    }

    let amount = fields[2].trim().parse::<f64>().ok()?;
    if !amount.is_finite() {
        return None;
    }

    Some(Transaction::new(date, description, amount))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_is_always_skipped() {
        let raw = "2024-01-01,Salary,2500\n2024-01-02,Coffee,-4.50";
        let parsed = parse_transactions(raw);

        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].description, "Coffee");
    }

    #[test]
    fn test_malformed_rows_are_dropped() {
        let raw = "Date,Description,Amount\n\
                   2024-01-01,Salary,2500\n\
                   bad,row\n\
                   ,Missing date,10\n\
                   2024-01-03, ,10\n\
                   2024-01-04,Rent,twelve\n\
                   2024-01-05,Overflow,inf\n\
                   2024-01-06,Not a number,NaN\n\
                   2024-01-07,Groceries,-42.50";
        let parsed = parse_transactions(raw);

        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0], Transaction::new("2024-01-01", "Salary", 2500.0));
        assert_eq!(parsed[1], Transaction::new("2024-01-07", "Groceries", -42.5));
    }

    #[test]
    fn test_blank_lines_and_crlf() {
        let raw = "Date,Description,Amount\r\n\r\n  \r\n2024-02-01, Bonus , 100 \r\n";
        let parsed = parse_transactions(raw);

        assert_eq!(parsed, vec![Transaction::new("2024-02-01", "Bonus", 100.0)]);
    }

    #[test]
    fn test_quoted_comma_corrupts_row() {
        let raw = "Date,Description,Amount\n2024-03-01,\"Smith, J\",50";
        assert!(parse_transactions(raw).is_empty());
    }

    #[test]
    fn test_extra_columns_are_ignored() {
        let raw = "Date,Description,Amount,Category\n2024-03-02,Bus fare,-2.75,Transport";
        let parsed = parse_transactions(raw);

        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].amount, -2.75);
    }

    #[test]
    fn test_output_never_exceeds_data_lines() {
        let inputs = [
            "",
            "only header",
            "h\n1,a,1",
            "h\n1,a,1\n2,b,2\n3,c,x",
            "\n\n\n",
        ];
        for raw in inputs {
            let lines = raw.lines().count();
            let parsed = parse_transactions(raw);
            assert!(parsed.len() <= lines.saturating_sub(1), "input {:?}", raw);
            for tx in &parsed {
                assert!(!tx.date.is_empty());
                assert!(!tx.description.is_empty());
                assert!(tx.amount.is_finite());
            }
        }
    }
}
