//! Fatal input conditions raised by the generator core.
//! Everything recoverable (bad style tokens, orphan targets, overflow) is logged
//! and defaulted instead of surfacing here.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    /// A data row with a blank `Row` column.
    #[error("line {line}: missing section name in the `Row` column")]
    MissingSection { line: usize },

    /// A panel-starting row that names neither a template nor a title.
    #[error(
        "line {line} (section '{section}'): panel row has neither Panel_Template nor Panel_Title"
    )]
    UnnamedPanel { section: String, line: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_line_numbers() {
        let err = InputError::MissingSection { line: 4 };
        assert!(err.to_string().contains("line 4"));

        let err = InputError::UnnamedPanel {
            section: "Power".into(),
            line: 7,
        };
        let msg = err.to_string();
        assert!(msg.contains("line 7"));
        assert!(msg.contains("'Power'"));
    }
}
