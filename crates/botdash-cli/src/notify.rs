use console::style;

/// Transient success notice, the terminal counterpart of a dashboard toast.
pub fn success(msg: &str) {
    println!("{} {msg}", style("✔").green().bold());
}

/// Failure notice. Never fatal on its own; callers decide whether to bail.
pub fn error(msg: &str) {
    eprintln!("{} {msg}", style("✖").red().bold());
}

pub fn info(msg: &str) {
    println!("{} {msg}", style("•").cyan());
}
