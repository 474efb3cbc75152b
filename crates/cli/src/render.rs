use roster_core::screen::{ViewModel, EMPTY_STATE_MESSAGE};
use roster_core::{Customer, UserType};

pub fn render_human(view: &ViewModel) -> String {
    let mut lines = Vec::new();
    lines.push(render_selector(view.role));
    lines.push(String::new());
    lines.push(view.title.clone());

    if let Some(message) = &view.error_message {
        lines.push(format!("! {message}"));
    }
    if view.show_search && !view.search_text.is_empty() {
        lines.push(format!("search: \"{}\"", view.search_text));
    }
    if view.is_loading {
        lines.push("loading...".to_string());
    }
    if view.is_refreshing {
        lines.push("refreshing...".to_string());
    }
    if view.is_empty {
        lines.push(EMPTY_STATE_MESSAGE.to_string());
    }

    let name_width = view.items.iter().map(|customer| customer.name.chars().count()).max();
    for customer in &view.items {
        lines.push(render_customer(customer, name_width.unwrap_or_default()));
    }

    lines.join("\n")
}

pub fn render_json(view: &ViewModel) -> String {
    serde_json::to_string_pretty(view).unwrap_or_else(|error| {
        format!("{{\"error\":\"view model serialization failed: {}\"}}", error)
    })
}

fn render_selector(selected: UserType) -> String {
    UserType::ALL
        .iter()
        .map(|role| {
            let marker = if *role == selected { "(x)" } else { "( )" };
            format!("{marker} {}", role.label().to_lowercase())
        })
        .collect::<Vec<_>>()
        .join("  ")
}

fn render_customer(customer: &Customer, name_width: usize) -> String {
    let initial = customer.initial().unwrap_or('?');
    let line = format!(
        "[{initial}] {name:<name_width$}  {role}  {email}",
        name = customer.name,
        role = customer.role,
        email = customer.email,
    );
    line.trim_end().to_string()
}
