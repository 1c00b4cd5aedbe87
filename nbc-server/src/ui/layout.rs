//! Page shell, form renderer and table renderer

use nbc_common::db::Table;
use serde_json::Value;

use crate::forms::{FieldKind, FieldSpec, FormSpec};
use crate::view::{Page, ViewState};

/// Escape text for HTML element content and attribute values
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn nav(view: &ViewState) -> String {
    let links: String = Page::NAV
        .iter()
        .filter(|page| !page.is_protected() || view.user.is_some())
        .map(|page| {
            let class = if *page == view.page { " class=\"active\"" } else { "" };
            format!("<a href=\"{}\"{}>{}</a>", page.path(), class, page.title())
        })
        .collect();

    let account = match &view.user {
        Some(user) => format!(
            r#"<form method="post" action="/logout" class="logout"><span>{}</span> <button type="submit">Logout</button></form>"#,
            escape(user)
        ),
        None => r#"<a href="/login">Admin login</a>"#.to_string(),
    };

    format!(r#"<nav><div class="links">{}</div><div class="account">{}</div></nav>"#, links, account)
}

/// Full HTML document around `body`
pub fn page(view: &ViewState, body: &str) -> String {
    let flashes: String = view
        .flashes
        .iter()
        .map(|f| format!(r#"<div class="flash {}">{}</div>"#, f.kind.css_class(), escape(&f.message)))
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} - Nursery Back Check</title>
    <link rel="stylesheet" href="/static/nbc.css">
</head>
<body>
    <header>
        <h1>Nursery Back Check</h1>
        <div class="build-info">v{version} [{git_hash}]</div>
    </header>
    {nav}
    <main>
        {flashes}
        {body}
    </main>
    <script src="/static/forms.js"></script>
</body>
</html>
"#,
        title = view.page.title(),
        version = env!("CARGO_PKG_VERSION"),
        git_hash = env!("GIT_HASH"),
        nav = nav(view),
        flashes = flashes,
        body = body,
    )
}

/// Options for location selects
#[derive(Debug, Clone, Default)]
pub struct FormContext {
    pub woredas: Vec<String>,
    /// Kebeles of the drafted woreda, so a re-rendered form keeps its choice
    pub kebeles: Vec<String>,
}

fn label(field: &FieldSpec) -> String {
    let required = if field.required { r#" <span class="required">*</span>"# } else { "" };
    match &field.label_am {
        Some(am) => format!("{} / {}{}", escape(&field.label), escape(am), required),
        None => format!("{}{}", escape(&field.label), required),
    }
}

fn options(choices: &[String], selected: &str, placeholder: &str) -> String {
    let mut html = format!(r#"<option value="">{}</option>"#, placeholder);
    for choice in choices {
        let attr = if choice == selected { " selected" } else { "" };
        html.push_str(&format!(
            r#"<option value="{0}"{1}>{0}</option>"#,
            escape(choice),
            attr
        ));
    }
    html
}

fn input(field: &FieldSpec, raw: &str, ctx: &FormContext) -> String {
    let name = escape(&field.name);
    let value = escape(raw);
    let required = if field.required { " required" } else { "" };

    match field.kind {
        FieldKind::Text => format!(
            r#"<input type="text" id="{0}" name="{0}" value="{1}"{2}>"#,
            name, value, required
        ),
        FieldKind::TextArea => format!(r#"<textarea id="{0}" name="{0}" rows="3">{1}</textarea>"#, name, value),
        FieldKind::Integer => format!(
            r#"<input type="number" id="{0}" name="{0}" value="{1}" min="0" step="1" inputmode="numeric">"#,
            name, value
        ),
        FieldKind::Real => format!(
            r#"<input type="number" id="{0}" name="{0}" value="{1}" min="0" step="0.1" inputmode="decimal">"#,
            name, value
        ),
        FieldKind::YesNo => {
            let yes = if value == "Yes" { " checked" } else { "" };
            let no = if value != "Yes" { " checked" } else { "" };
            format!(
                r#"<span class="radio"><label><input type="radio" name="{0}" value="Yes"{1}> Yes / አዎ</label> <label><input type="radio" name="{0}" value="No"{2}> No / አይ</label></span>"#,
                name, yes, no
            )
        }
        FieldKind::WoredaSelect if ctx.woredas.is_empty() => format!(
            r#"<input type="text" id="{0}" name="{0}" value="{1}"{2}>"#,
            name, value, required
        ),
        FieldKind::WoredaSelect => format!(
            r#"<select id="{0}" name="{0}" data-kebele-target="kebele"{1}>{2}</select>"#,
            name,
            required,
            options(&ctx.woredas, raw, "Select woreda")
        ),
        FieldKind::KebeleSelect if ctx.woredas.is_empty() => format!(
            r#"<input type="text" id="{0}" name="{0}" value="{1}"{2}>"#,
            name, value, required
        ),
        FieldKind::KebeleSelect => format!(
            r#"<select id="{0}" name="{0}"{1}>{2}</select>"#,
            name,
            required,
            options(&ctx.kebeles, raw, "Select kebele")
        ),
        FieldKind::Photo => format!(
            r#"<input type="file" accept="image/*" capture="environment" data-base64-target="{0}"><input type="hidden" id="{0}" name="{0}" value="{1}">"#,
            name, value
        ),
        FieldKind::Audio => format!(
            r#"<input type="file" accept="audio/*" data-base64-target="{0}"><input type="hidden" id="{0}" name="{0}" value="{1}">"#,
            name, value
        ),
    }
}

/// Render a form from its spec, pre-filled from the view's draft
pub fn render_form(spec: &FormSpec, view: &ViewState, ctx: &FormContext) -> String {
    let mut html = format!(
        r#"<h2>{}</h2><form method="post" action="{}" id="{}-form" class="entry-form">"#,
        escape(spec.title),
        spec.action,
        spec.id
    );

    for section in &spec.sections {
        html.push_str(&format!(r#"<fieldset><legend>{}</legend>"#, escape(&section.title)));
        for field in &section.fields {
            let error = view
                .field_error(&field.name)
                .map(|msg| format!(r#"<div class="field-error">{}</div>"#, escape(msg)))
                .unwrap_or_default();
            html.push_str(&format!(
                r#"<div class="field{}"><label for="{}">{}</label>{}{}</div>"#,
                if error.is_empty() { "" } else { " invalid" },
                escape(&field.name),
                label(field),
                input(field, view.draft_value(&field.name), ctx),
                error
            ));
        }
        html.push_str("</fieldset>");
    }

    html.push_str(&format!(
        r#"<button type="submit" class="primary">{}</button></form>"#,
        escape(spec.submit_label)
    ));
    html
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => escape(s),
        other => escape(&other.to_string()),
    }
}

/// Render a projected table; `delete_action` maps a row id to a POST target
pub fn render_table(table: &Table, delete_action: Option<&dyn Fn(i64) -> String>) -> String {
    if table.is_empty() {
        return r#"<p class="empty">No records yet.</p>"#.to_string();
    }

    let id_index = table.column_index("id");
    let mut html = String::from(r#"<div class="table-wrap"><table><thead><tr>"#);
    for column in &table.columns {
        html.push_str(&format!("<th>{}</th>", escape(column)));
    }
    if delete_action.is_some() {
        html.push_str("<th></th>");
    }
    html.push_str("</tr></thead><tbody>");

    for row in &table.rows {
        html.push_str("<tr>");
        for value in row {
            html.push_str(&format!("<td>{}</td>", cell(value)));
        }
        let id = id_index.and_then(|i| row.get(i)).and_then(Value::as_i64);
        if let (Some(action), Some(id)) = (delete_action, id) {
            html.push_str(&format!(
                r#"<td><form method="post" action="{}" onsubmit="return confirm('Delete record {}?')"><button type="submit" class="danger">Delete</button></form></td>"#,
                action(id),
                id
            ));
        }
        html.push_str("</tr>");
    }

    html.push_str("</tbody></table></div>");
    html
}
