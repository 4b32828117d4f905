//! Terminal output formatting with colors
//!
//! Respects NO_COLOR, CLICOLOR, CLICOLOR_FORCE automatically.

use colored::Colorize;
use termtree::Tree;

use crate::domain::{Node, NodeKind, RequirementEntry};

/// Print error (red bold "error:" prefix) to stderr
pub fn error(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "error".red().bold(), msg);
}

/// Print warning (yellow "Warning:" prefix) to stderr
pub fn warning(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "Warning".yellow(), msg);
}

/// Print success status (green checkmark)
pub fn success(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{} {}", "✓".green(), msg);
}

/// Print completed action (green label)
pub fn action(label: &str, msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}: {}", label.green(), msg);
}

/// Print section header (cyan bold)
pub fn header(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg.to_string().cyan().bold());
}

/// Print indented detail (no color)
pub fn detail(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("  {}", msg);
}

/// Print plain output (no color, for data/JSON)
pub fn info(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg);
}

/// Print a checklist line: green checkmark when provided, red X when missing,
/// dimmed when the entry is optional.
pub fn requirement(entry: &RequirementEntry, checked: bool) {
    let mark = if checked {
        "✓".green()
    } else if entry.optional {
        "·".dimmed()
    } else {
        "✗".red()
    };
    let mut line = entry.name.clone();
    if let Some(group) = &entry.group {
        line.push_str(&format!(" (one of: {})", group));
    }
    if entry.optional {
        line.push_str(" [optional]");
    }
    println!("  {} {}", mark, line);
    if !entry.note.is_empty() {
        println!("      {}", entry.note.dimmed());
    }
    if let Some(source) = &entry.source {
        println!("      {} {}", source.label.dimmed(), source.link.underline());
    }
}

/// Render a requirement tree for display.
pub fn render_tree(node: &Node) -> Tree<String> {
    let label = match &node.kind {
        NodeKind::Condition(_) => node.to_string().bold().to_string(),
        NodeKind::Requirement(_) => node.to_string(),
    };
    Tree::new(label).with_leaves(node.children().iter().map(render_tree))
}
