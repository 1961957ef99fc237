//! printf-style message formatting
//!
//! Directives: `%s` string, `%d`/`%i` integer, `%f` float, `%j`/`%o`/`%O`
//! JSON, `%%` a literal percent sign. Leftover parameters are appended
//! separated by spaces. Without parameters the template is returned as is.

use serde_json::Value;

pub fn format_message(template: &str, params: &[Value]) -> String {
    if params.is_empty() {
        return template.to_string();
    }

    let mut out = String::with_capacity(template.len());
    let mut remaining = params.iter();
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        let Some(&directive) = chars.peek() else {
            out.push('%');
            break;
        };
        match directive {
            '%' => {
                chars.next();
                out.push('%');
            }
            's' | 'd' | 'i' | 'f' | 'j' | 'o' | 'O' => {
                chars.next();
                match remaining.next() {
                    Some(param) => out.push_str(&render(directive, param)),
                    None => {
                        out.push('%');
                        out.push(directive);
                    }
                }
            }
            _ => out.push('%'),
        }
    }

    for param in remaining {
        out.push(' ');
        out.push_str(&as_string(param));
    }
    out
}

fn render(directive: char, param: &Value) -> String {
    match directive {
        's' => as_string(param),
        'd' | 'i' => as_number(param)
            .map(|n| format!("{}", n.trunc()))
            .unwrap_or_else(|| "NaN".to_string()),
        'f' => as_number(param)
            .map(|n| n.to_string())
            .unwrap_or_else(|| "NaN".to_string()),
        _ => param.to_string(),
    }
}

fn as_string(param: &Value) -> String {
    match param {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn as_number(param: &Value) -> Option<f64> {
    match param {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}
