use console::style;

pub struct Output;

impl Output {
    pub fn new() -> Self {
        Self
    }

    pub fn success(&self, message: &str) {
        println!("{} {}", style("✓").green(), message);
    }

    pub fn error(&self, message: &str) {
        eprintln!("{} {}", style("✗").red(), message);
    }

    pub fn warning(&self, message: &str) {
        println!("{} {}", style("⚠").yellow(), message);
    }

    pub fn info(&self, message: &str) {
        println!("{} {}", style("ℹ").blue(), message);
    }

    pub fn section(&self, message: &str) {
        println!("\n{}", style(message).bold());
        println!("{}", "─".repeat(40));
    }

    /// Token/cost accounting line shown after model calls
    pub fn cost(&self, prompt_tokens: u32, completion_tokens: u32, cost_usd: f64, total_usd: f64) {
        println!(
            "{} {} prompt + {} completion tokens · ${:.4} this call · ${:.4} session",
            style("$").cyan(),
            prompt_tokens,
            completion_tokens,
            cost_usd,
            total_usd
        );
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}
