//! Rendering of native cell values through spreadsheet number formats, used
//! when a member asks for the cell text as the sheet displays it.

use chrono::NaiveDateTime;

use crate::{parse::serial_to_datetime, sheet::CellValue};

/// Renders `value` with `format`, or `None` when the format does not apply
/// to the value (text cells, `General`, unsupported sections).
pub fn render_with_format(value: &CellValue, format: &str) -> Option<String> {
    let section = first_section(format);
    let trimmed = section.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("general") || trimmed == "@" {
        return None;
    }
    if is_date_format(trimmed) {
        let datetime = match value {
            CellValue::DateTime(dt) => Some(*dt),
            CellValue::Number(serial) => serial_to_datetime(*serial),
            _ => None,
        }?;
        return Some(render_datetime(datetime, trimmed));
    }
    let number = match value {
        CellValue::Number(f) => *f,
        _ => return None,
    };
    Some(render_number(number, trimmed))
}

/// Only the positive section of `pos;neg;zero;text` formats is honoured;
/// negative values get a leading minus sign.
fn first_section(format: &str) -> &str {
    let mut in_quotes = false;
    for (idx, ch) in format.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => return &format[..idx],
            _ => {}
        }
    }
    format
}

fn is_date_format(format: &str) -> bool {
    let mut in_quotes = false;
    let mut in_brackets = false;
    for ch in format.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            '[' => in_brackets = true,
            ']' => in_brackets = false,
            'y' | 'Y' | 'd' | 'D' | 'h' | 'H' | 's' | 'S' if !in_quotes && !in_brackets => {
                return true;
            }
            _ => {}
        }
    }
    false
}

fn render_datetime(value: NaiveDateTime, format: &str) -> String {
    let chars: Vec<char> = format.chars().collect();
    let has_am_pm = format.to_ascii_uppercase().contains("AM/PM");
    let mut pattern = String::new();
    let mut idx = 0;
    // Whether the last emitted component was an hour; `m` right after an
    // hour (or right before seconds) means minutes.
    let mut after_hour = false;
    while idx < chars.len() {
        let ch = chars[idx];
        let run = chars[idx..]
            .iter()
            .take_while(|c| c.eq_ignore_ascii_case(&ch))
            .count();
        match ch.to_ascii_lowercase() {
            'y' => {
                pattern.push_str(if run <= 2 { "%y" } else { "%Y" });
                after_hour = false;
            }
            'd' => {
                pattern.push_str(match run {
                    1 => "%-d",
                    2 => "%d",
                    3 => "%a",
                    _ => "%A",
                });
                after_hour = false;
            }
            'h' => {
                let twelve = has_am_pm;
                pattern.push_str(match (run, twelve) {
                    (1, false) => "%-H",
                    (_, false) => "%H",
                    (1, true) => "%-I",
                    (_, true) => "%I",
                });
                after_hour = true;
            }
            'm' => {
                let next_is_seconds = chars[idx + run..]
                    .iter()
                    .find(|c| c.is_ascii_alphabetic())
                    .is_some_and(|c| c.eq_ignore_ascii_case(&'s'));
                if after_hour || next_is_seconds {
                    pattern.push_str(if run == 1 { "%-M" } else { "%M" });
                } else {
                    pattern.push_str(match run {
                        1 => "%-m",
                        2 => "%m",
                        3 => "%b",
                        _ => "%B",
                    });
                }
                after_hour = false;
            }
            's' => {
                pattern.push_str(if run == 1 { "%-S" } else { "%S" });
                after_hour = false;
            }
            'a' if format[char_offset(&chars, idx)..]
                .to_ascii_uppercase()
                .starts_with("AM/PM") =>
            {
                pattern.push_str("%p");
                idx += 5;
                continue;
            }
            '"' => {
                let literal: String = chars[idx + 1..].iter().take_while(|c| **c != '"').collect();
                pattern.push_str(&literal.replace('%', "%%"));
                idx += literal.chars().count() + 2;
                continue;
            }
            '\\' => {
                if let Some(next) = chars.get(idx + 1) {
                    push_literal(&mut pattern, *next);
                }
                idx += 2;
                continue;
            }
            '[' => {
                let skipped = chars[idx..].iter().take_while(|c| **c != ']').count();
                idx += skipped + 1;
                continue;
            }
            _ => {
                for _ in 0..run {
                    push_literal(&mut pattern, ch);
                }
            }
        }
        idx += run;
    }
    value.format(&pattern).to_string()
}

fn char_offset(chars: &[char], idx: usize) -> usize {
    chars[..idx].iter().map(|c| c.len_utf8()).sum()
}

fn push_literal(pattern: &mut String, ch: char) {
    if ch == '%' {
        pattern.push_str("%%");
    } else {
        pattern.push(ch);
    }
}

fn render_number(value: f64, format: &str) -> String {
    let Some((start, end)) = placeholder_span(format) else {
        return literal_text(format);
    };
    let prefix = literal_text(&format[..start]);
    let suffix = literal_text(&format[end..]);
    let body = &format[start..end];

    let percent_count = format.chars().filter(|c| *c == '%').count();
    let mut scaled = value.abs();
    for _ in 0..percent_count {
        scaled *= 100.0;
    }

    let (integer_part, fraction_part) = match body.split_once('.') {
        Some((int, frac)) => (int, frac),
        None => (body, ""),
    };
    let decimals = fraction_part
        .chars()
        .filter(|c| matches!(c, '0' | '#' | '?'))
        .count();
    let grouping = integer_part.contains(',');
    let min_integer_digits = integer_part.chars().filter(|c| *c == '0').count();

    let fixed = format!("{scaled:.decimals$}");
    let (int_digits, frac_digits) = match fixed.split_once('.') {
        Some((int, frac)) => (int.to_string(), frac.to_string()),
        None => (fixed.clone(), String::new()),
    };
    let mut int_digits = if int_digits == "0" && min_integer_digits == 0 {
        String::new()
    } else {
        int_digits
    };
    while int_digits.len() < min_integer_digits {
        int_digits.insert(0, '0');
    }
    if grouping {
        int_digits = group_thousands(&int_digits);
    }

    let mut rendered = String::new();
    if value < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0') {
        rendered.push('-');
    }
    rendered.push_str(&prefix);
    rendered.push_str(&int_digits);
    if decimals > 0 {
        rendered.push('.');
        rendered.push_str(&frac_digits);
    }
    rendered.push_str(&suffix);
    rendered
}

fn placeholder_span(format: &str) -> Option<(usize, usize)> {
    let mut in_quotes = false;
    let mut first = None;
    let mut last = None;
    for (idx, ch) in format.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            '0' | '#' | '?' | '.' | ',' if !in_quotes => {
                if first.is_none() && ch != ',' {
                    first = Some(idx);
                }
                if first.is_some() {
                    last = Some(idx + ch.len_utf8());
                }
            }
            _ => {}
        }
    }
    first.zip(last)
}

fn literal_text(segment: &str) -> String {
    let mut out = String::new();
    let mut chars = segment.chars();
    let mut in_quotes = false;
    while let Some(ch) = chars.next() {
        match ch {
            '"' => in_quotes = !in_quotes,
            '\\' if !in_quotes => {
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            '_' | '*' if !in_quotes => {
                // Padding directives take the next character as width hint.
                chars.next();
            }
            _ => out.push(ch),
        }
    }
    out
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (len - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
