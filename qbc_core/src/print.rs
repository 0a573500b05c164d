//! PRINT rendering: number padding, 14-column print zones, newline rules.

use crate::error::RuntimeError;
use crate::host::Host;
use crate::value::{format_number, Value};

/// Width of one print zone, the tabulation unit of the comma separator.
pub const PRINT_ZONE_WIDTH: usize = 14;

/// An evaluated PRINT argument.
#[derive(Debug)]
pub enum PrintArg {
    Comma,
    Semicolon,
    Value(Value),
}

/// Render one value the way PRINT writes it: strings verbatim, numbers
/// with a sign cue (space when non-negative) and a trailing space.
pub fn render_value(v: &Value) -> Result<String, RuntimeError> {
    match v {
        Value::Str(s) => Ok(s.clone()),
        _ => {
            let digits = format_number(v)?;
            let sign_cue = if digits.starts_with('-') { "" } else { " " };
            Ok(format!("{}{} ", sign_cue, digits))
        }
    }
}

/// Cursor column tracking, persistent across PRINT statements so comma
/// zones line up even when a statement suppressed its newline.
#[derive(Debug, Default)]
pub struct PrintState {
    col: usize,
}

impl PrintState {
    pub fn new() -> Self {
        PrintState { col: 0 }
    }

    pub fn col(&self) -> usize {
        self.col
    }

    /// Reset the column, e.g. after the user's echoed Enter on INPUT.
    pub fn reset_col(&mut self) {
        self.col = 0;
    }

    /// Write text through the host, tracking the cursor column.
    pub fn write(&mut self, host: &mut dyn Host, text: &str) {
        for ch in text.chars() {
            if ch == '\n' {
                self.col = 0;
            } else {
                self.col += 1;
            }
        }
        host.print(text);
    }

    /// Execute one PRINT statement over evaluated arguments.
    pub fn print(&mut self, host: &mut dyn Host, args: &[PrintArg]) -> Result<(), RuntimeError> {
        for arg in args {
            match arg {
                PrintArg::Value(v) => {
                    let text = render_value(v)?;
                    self.write(host, &text);
                }
                PrintArg::Comma => {
                    let pad = PRINT_ZONE_WIDTH - self.col % PRINT_ZONE_WIDTH;
                    self.write(host, &" ".repeat(pad));
                }
                PrintArg::Semicolon => {}
            }
        }
        let suppress_newline = matches!(args.last(), Some(PrintArg::Comma | PrintArg::Semicolon));
        if !suppress_newline {
            self.write(host, "\n");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::TestHost;

    #[test]
    fn positive_number_gets_sign_cue_and_trailing_space() {
        assert_eq!(render_value(&Value::Integer(1)).unwrap(), " 1 ");
    }

    #[test]
    fn negative_number_has_no_sign_cue() {
        assert_eq!(render_value(&Value::Integer(-2)).unwrap(), "-2 ");
    }

    #[test]
    fn strings_render_verbatim() {
        assert_eq!(render_value(&Value::Str("HELLO".into())).unwrap(), "HELLO");
    }

    #[test]
    fn plain_print_appends_newline() {
        let mut host = TestHost::new();
        let mut state = PrintState::new();
        state
            .print(&mut host, &[PrintArg::Value(Value::Str("HI".into()))])
            .unwrap();
        assert_eq!(host.output, "HI\n");
    }

    #[test]
    fn empty_print_is_a_blank_line() {
        let mut host = TestHost::new();
        let mut state = PrintState::new();
        state.print(&mut host, &[]).unwrap();
        assert_eq!(host.output, "\n");
    }

    #[test]
    fn trailing_semicolon_suppresses_newline() {
        let mut host = TestHost::new();
        let mut state = PrintState::new();
        state
            .print(
                &mut host,
                &[PrintArg::Value(Value::Str("A".into())), PrintArg::Semicolon],
            )
            .unwrap();
        state
            .print(&mut host, &[PrintArg::Value(Value::Str("B".into()))])
            .unwrap();
        assert_eq!(host.output, "AB\n");
    }

    #[test]
    fn comma_pads_to_next_zone() {
        let mut host = TestHost::new();
        let mut state = PrintState::new();
        state
            .print(
                &mut host,
                &[
                    PrintArg::Value(Value::Str("AB".into())),
                    PrintArg::Comma,
                    PrintArg::Value(Value::Str("C".into())),
                ],
            )
            .unwrap();
        assert_eq!(host.output, format!("AB{}C\n", " ".repeat(12)));
    }

    #[test]
    fn comma_on_zone_boundary_skips_a_full_zone() {
        let mut host = TestHost::new();
        let mut state = PrintState::new();
        state
            .print(
                &mut host,
                &[
                    PrintArg::Value(Value::Str("ABCDEFGHIJKLMN".into())),
                    PrintArg::Comma,
                    PrintArg::Value(Value::Str("X".into())),
                ],
            )
            .unwrap();
        assert_eq!(
            host.output,
            format!("ABCDEFGHIJKLMN{}X\n", " ".repeat(14))
        );
    }

    #[test]
    fn column_tracks_across_statements() {
        let mut host = TestHost::new();
        let mut state = PrintState::new();
        state
            .print(
                &mut host,
                &[PrintArg::Value(Value::Str("AB".into())), PrintArg::Semicolon],
            )
            .unwrap();
        assert_eq!(state.col(), 2);
        state
            .print(
                &mut host,
                &[PrintArg::Comma, PrintArg::Value(Value::Str("X".into()))],
            )
            .unwrap();
        assert_eq!(host.output, format!("AB{}X\n", " ".repeat(12)));
    }
}
