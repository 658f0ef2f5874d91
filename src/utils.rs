use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

pub static PROGRESS_TEMPLATE: &str = "[{elapsed_precise}] {bar:40.cyan/blue} {human_pos:>7}/{human_len:7} {msg}";
pub static SPINNER_TEMPLATE: &str = "[{elapsed_precise}] {spinner:2.cyan/blue} {msg}";
pub static SPINNER_TOTALS_TEMPLATE: &str = "{spinner:2.cyan/blue} {msg}: {human_pos}";

pub fn new_spinner(message: &str) -> ProgressBar {
    let style = ProgressStyle::with_template(SPINNER_TEMPLATE).expect("Invalid spinner template");
    ProgressBar::new_spinner().with_message(message.to_string()).with_style(style)
}

pub fn new_progress_bar(total: usize, message: &str) -> ProgressBar {
    let style = ProgressStyle::with_template(PROGRESS_TEMPLATE).expect("Invalid progress bar template");
    ProgressBar::new(total as u64).with_message(message.to_string()).with_style(style)
}

pub fn new_spinner_totals(message: &str) -> ProgressBar {
    let style = ProgressStyle::with_template(SPINNER_TOTALS_TEMPLATE).expect("Invalid spinner template");
    ProgressBar::new_spinner().with_message(message.to_string()).with_style(style)
}

/// A primary progress bar plus any number of auxiliary spinners (e.g. a load's
/// row counter alongside per-strategy mapping counters), rendered together.
#[derive(Clone)]
pub struct LoadBars {
    bars: MultiProgress,
    pub primary: ProgressBar,
    others: Vec<ProgressBar>,
}

impl LoadBars {
    pub fn new(total: usize, message: &str) -> LoadBars {
        let bars = MultiProgress::new();
        let primary = new_progress_bar(total, message);
        bars.add(primary.clone());
        primary.enable_steady_tick(Duration::from_millis(200));

        LoadBars { bars, primary, others: vec![] }
    }

    pub fn add_spinner(&mut self, message: &str) -> ProgressBar {
        let bar = new_spinner_totals(message);
        self.bars.add(bar.clone());
        bar.enable_steady_tick(Duration::from_millis(200));
        self.others.push(bar.clone());
        bar
    }

    pub fn finish(&self) {
        self.primary.finish();
        for bar in &self.others {
            bar.finish();
        }
    }
}
