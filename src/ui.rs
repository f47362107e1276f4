use colored::Colorize;
use reconcile::{REDACTED, ResourcePolicy, Value};

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

// ============================================================================
// Attribute Formatting
// ============================================================================

/// Render a field value for display, hiding sensitive values
pub fn display_value(policy: &ResourcePolicy, field: &str, value: &Value) -> String {
    if policy.is_sensitive(field) {
        REDACTED.to_string()
    } else {
        match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}
