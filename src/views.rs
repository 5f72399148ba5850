//! Server-rendered HTML pages.

use axum::response::Html;

use crate::auth::{cookies::Flash, services::SessionUser};
use crate::scans::{dto::HistoryItem, repo_types::NutritionFacts};

const ML_UNAVAILABLE: &str = "Milk tea model is unavailable right now; showing sample values.";

pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(ch),
        }
    }
    out
}

fn layout(title: &str, user: Option<&SessionUser>, notices: &[&str], body: &str) -> Html<String> {
    let nav = match user {
        Some(u) => format!(
            r#"<nav><span>Hi, {}</span> <a href="/scan">Scan</a> <a href="/history">History</a> <a href="/logout">Log out</a></nav>"#,
            escape(u.display_name())
        ),
        None => String::new(),
    };
    let notices: String = notices
        .iter()
        .map(|n| format!(r#"<p class="flash">{}</p>"#, escape(n)))
        .collect();
    Html(format!(
        "<!doctype html>\n<html><head><meta charset=\"utf-8\"><title>{} | NutriBob</title></head>\
         <body><header><h1>NutriBob</h1>{}</header>{}<main>{}</main></body></html>",
        escape(title),
        nav,
        notices,
        body
    ))
}

pub fn login_page(flash: Option<Flash>) -> Html<String> {
    let notices: Vec<&str> = flash.map(Flash::message).into_iter().collect();
    layout(
        "Login",
        None,
        &notices,
        r#"<h2>Login</h2><p>Sign in to scan your milk tea.</p><a class="button" href="/login/google">Login with Google</a>"#,
    )
}

pub fn scan_page(user: &SessionUser, flash: Option<Flash>) -> Html<String> {
    let notices: Vec<&str> = flash.map(Flash::message).into_iter().collect();
    layout(
        "Scan",
        Some(user),
        &notices,
        r#"<h2>Scan a drink</h2>
<form action="/scan" method="post" enctype="multipart/form-data">
<label>Take a photo <input type="file" name="image1" accept="image/*" capture="environment"></label>
<label>or choose a file <input type="file" name="image2" accept="image/*"></label>
<button type="submit">Analyze</button>
</form>"#,
    )
}

pub struct ResultView<'a> {
    pub nutrition: &'a NutritionFacts,
    pub label: Option<&'a str>,
    pub recipe: Option<&'a str>,
    pub analysis_error: Option<&'a str>,
    pub scan_id: Option<&'a str>,
    pub ml_unavailable: bool,
}

pub fn result_page(user: &SessionUser, view: &ResultView<'_>) -> Html<String> {
    let mut body = String::from("<h2>Your drink</h2>");
    if let Some(label) = view.label {
        body.push_str(&format!(r#"<p class="label">{}</p>"#, escape(label)));
    }
    if let Some(recipe) = view.recipe {
        body.push_str(&format!(r#"<p class="recipe">Ingredients: {}</p>"#, escape(recipe)));
    }
    if let Some(err) = view.analysis_error {
        body.push_str(&format!(r#"<p class="warning">{}</p>"#, escape(err)));
    }
    body.push_str(&format!(
        "<ul><li>Calories: {}</li><li>Sugar: {} g</li><li>Fat: {} g</li></ul>",
        view.nutrition.calories, view.nutrition.sugar_grams, view.nutrition.fat_grams
    ));
    if let Some(id) = view.scan_id {
        body.push_str(&format!(
            r#"<img src="/image/{}" alt="your scan" width="224">"#,
            escape(id)
        ));
    }
    body.push_str(r#"<p><a href="/scan">Scan another</a></p>"#);

    let notices: Vec<&str> = if view.ml_unavailable {
        vec![ML_UNAVAILABLE]
    } else {
        Vec::new()
    };
    layout("Result", Some(user), &notices, &body)
}

pub fn history_page(user: &SessionUser, scans: &[HistoryItem]) -> Html<String> {
    let body = if scans.is_empty() {
        "<h2>History</h2><p>No scans yet.</p>".to_string()
    } else {
        let rows: String = scans
            .iter()
            .map(|s| {
                let calories = s
                    .calories
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "-".into());
                format!(
                    r#"<tr><td><a href="/image/{id}">{drink}</a></td><td>{calories}</td><td>{when}</td></tr>"#,
                    id = escape(&s.id),
                    drink = escape(&s.drink),
                    calories = calories,
                    when = escape(s.scanned_at.as_deref().unwrap_or("-"))
                )
            })
            .collect();
        format!(
            "<h2>History</h2><table><tr><th>Drink</th><th>Calories</th><th>Scanned</th></tr>{}</table>",
            rows
        )
    };
    layout("History", Some(user), &[], &body)
}
