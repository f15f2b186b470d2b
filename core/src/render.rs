//! HTML for the prediction form and its result section.

use std::fmt::Write;

use crate::artifacts::InferenceContext;
use crate::types::{CustomerRecord, Prediction, Verdict};

pub const AGE_RANGE: (u32, u32) = (18, 92);
pub const TENURE_RANGE: (u32, u32) = (0, 10);
pub const PRODUCTS_RANGE: (u32, u32) = (1, 4);

/// What to show under the form.
pub enum Outcome<'a> {
    Empty,
    Predicted(&'a Prediction),
    Failed(&'a str),
}

pub fn page(
    context: &InferenceContext,
    record: Option<&CustomerRecord>,
    outcome: Outcome<'_>,
) -> String {
    let mut html = String::with_capacity(4096);
    html.push_str(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Customer Churn Prediction</title>\n<style>\n\
         body{font-family:sans-serif;max-width:40rem;margin:2rem auto;padding:0 1rem}\n\
         label{display:block;margin-top:.8rem}\n\
         .error{background:#fde2e2;padding:.8rem}\n.success{background:#e2f5e6;padding:.8rem}\n\
         </style>\n</head>\n<body>\n<h1>Customer Churn Prediction</h1>\n",
    );
    html.push_str(&form(context, record));

    match outcome {
        Outcome::Empty => {}
        Outcome::Predicted(prediction) => html.push_str(&result_section(prediction)),
        Outcome::Failed(message) => {
            let _ = write!(
                html,
                "<section>\n<h2>Prediction Failed</h2>\n<p class=\"error\">{}</p>\n</section>\n",
                escape(message)
            );
        }
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn form(context: &InferenceContext, record: Option<&CustomerRecord>) -> String {
    let mut html = String::new();
    html.push_str("<form method=\"post\" action=\"/predict\">\n");

    html.push_str(&select(
        "geography",
        "Geography",
        context.geography().categories(),
        record.map(|r| r.geography.as_str()),
    ));
    html.push_str(&select(
        "gender",
        "Gender",
        context.gender().classes(),
        record.map(|r| r.gender.as_str()),
    ));
    html.push_str(&slider("age", "Age", AGE_RANGE, record.map(|r| r.age)));
    html.push_str(&number("balance", "Balance", record.map(|r| r.balance)));
    html.push_str(&number(
        "credit_score",
        "Credit Score",
        record.map(|r| r.credit_score),
    ));
    html.push_str(&number(
        "estimated_salary",
        "Estimated Salary",
        record.map(|r| r.estimated_salary),
    ));
    html.push_str(&slider("tenure", "Tenure", TENURE_RANGE, record.map(|r| r.tenure)));
    html.push_str(&slider(
        "num_of_products",
        "Number of Products",
        PRODUCTS_RANGE,
        record.map(|r| r.num_of_products),
    ));

    let flags = ["0".to_string(), "1".to_string()];
    let has_card = record.map(|r| r.has_cr_card.to_string());
    html.push_str(&select("has_cr_card", "Has Credit Card", &flags, has_card.as_deref()));
    let is_active = record.map(|r| r.is_active_member.to_string());
    html.push_str(&select(
        "is_active_member",
        "Is Active Member",
        &flags,
        is_active.as_deref(),
    ));

    html.push_str("<p><button type=\"submit\">Predict Churn</button></p>\n</form>\n");
    html
}

fn result_section(prediction: &Prediction) -> String {
    let (class, icon) = match prediction.verdict {
        Verdict::LikelyToChurn => ("error", "\u{26a0}\u{fe0f}"),
        Verdict::NotLikelyToChurn => ("success", "\u{2705}"),
    };
    format!(
        "<section>\n<h2>Prediction Result</h2>\n\
         <p><strong>Churn Probability:</strong> <code>{}</code></p>\n\
         <p class=\"{}\">{} {}</p>\n</section>\n",
        prediction.display_probability(),
        class,
        icon,
        prediction.verdict.message()
    )
}

fn select(name: &str, label: &str, options: &[String], selected: Option<&str>) -> String {
    let mut html = format!(
        "<label for=\"{name}\">{label}</label>\n<select id=\"{name}\" name=\"{name}\">\n",
        name = name,
        label = label
    );
    for option in options {
        let marker = if selected == Some(option.as_str()) {
            " selected"
        } else {
            ""
        };
        let _ = writeln!(
            html,
            "<option value=\"{value}\"{marker}>{value}</option>",
            value = escape(option),
            marker = marker
        );
    }
    html.push_str("</select>\n");
    html
}

fn slider(name: &str, label: &str, (min, max): (u32, u32), value: Option<u32>) -> String {
    format!(
        "<label for=\"{name}\">{label}</label>\n\
         <input type=\"range\" id=\"{name}\" name=\"{name}\" min=\"{min}\" max=\"{max}\" value=\"{value}\" \
         oninput=\"this.nextElementSibling.value=this.value\"><output>{value}</output>\n",
        name = name,
        label = label,
        min = min,
        max = max,
        value = value.unwrap_or(min)
    )
}

fn number(name: &str, label: &str, value: Option<f64>) -> String {
    format!(
        "<label for=\"{name}\">{label}</label>\n\
         <input type=\"number\" step=\"any\" id=\"{name}\" name=\"{name}\" value=\"{value}\" required>\n",
        name = name,
        label = label,
        value = value.unwrap_or(0.0)
    )
}

pub fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
