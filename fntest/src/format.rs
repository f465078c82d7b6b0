//! Text rendering for report lines and argument records

use std::fmt::Debug;
use std::time::Duration;

use console::style;

/// Renders a positional record as `( a, b, c )`
pub trait FormatRecord {
    /// Stringified record, elements in `Debug` form
    fn format_record(&self) -> String;
}

macro_rules! impl_format_record {
    ($($idx:tt $arg:ident),*) => {
        impl<$($arg: Debug),*> FormatRecord for ($($arg,)*) {
            #[allow(unused_mut)]
            fn format_record(&self) -> String {
                let mut fields: Vec<String> = Vec::new();
                $(fields.push(format!("{:?}", self.$idx));)*
                format!("( {} )", fields.join(", "))
            }
        }
    };
}

impl_format_record!();
impl_format_record!(0 A);
impl_format_record!(0 A, 1 B);
impl_format_record!(0 A, 1 B, 2 C);
impl_format_record!(0 A, 1 B, 2 C, 3 D);
impl_format_record!(0 A, 1 B, 2 C, 3 D, 4 E);
impl_format_record!(0 A, 1 B, 2 C, 3 D, 4 E, 5 F);
impl_format_record!(0 A, 1 B, 2 C, 3 D, 4 E, 5 F, 6 G);
impl_format_record!(0 A, 1 B, 2 C, 3 D, 4 E, 5 F, 6 G, 7 H);
impl_format_record!(0 A, 1 B, 2 C, 3 D, 4 E, 5 F, 6 G, 7 H, 8 I);
impl_format_record!(0 A, 1 B, 2 C, 3 D, 4 E, 5 F, 6 G, 7 H, 8 I, 9 J);
impl_format_record!(0 A, 1 B, 2 C, 3 D, 4 E, 5 F, 6 G, 7 H, 8 I, 9 J, 10 K);
impl_format_record!(0 A, 1 B, 2 C, 3 D, 4 E, 5 F, 6 G, 7 H, 8 I, 9 J, 10 K, 11 L);

/// Pad `label` with dots to exactly `width` characters, cutting longer labels
pub fn padded_label(label: &str, width: usize) -> String {
    let mut line: String = label.chars().take(width).collect();
    let missing = width.saturating_sub(line.chars().count());
    line.extend(std::iter::repeat('.').take(missing));
    line
}

/// Whole milliseconds, as shown by the direct tester
pub fn millis(duration: Duration) -> u128 {
    duration.as_millis()
}

/// Whole microseconds, as shown by the randomized tester
pub fn micros(duration: Duration) -> u128 {
    duration.as_micros()
}

/// Display tone of a status token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Pass,
    Fail,
    Error,
}

/// Style `token` for the terminal when `color` is set
pub fn paint(token: &str, tone: Tone, color: bool) -> String {
    if !color {
        return token.to_string();
    }

    let styled = style(token).force_styling(true).bold();
    let styled = match tone {
        Tone::Pass => styled.green(),
        Tone::Fail => styled.red(),
        Tone::Error => styled.yellow(),
    };

    styled.to_string()
}
