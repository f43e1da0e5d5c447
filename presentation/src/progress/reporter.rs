//! Progress reporting for authoring, evaluation and simulation runs

use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::Duration;
use storytime_application::{AuthoringState, SessionKind, SessionProgressNotifier};
use storytime_domain::core::string::preview;

/// Reports progress with spinners and a cycle bar
pub struct ProgressReporter {
    multi: MultiProgress,
    session_bar: Mutex<Option<ProgressBar>>,
    cycle_bar: Mutex<Option<ProgressBar>>,
    verbose: bool,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            session_bar: Mutex::new(None),
            cycle_bar: Mutex::new(None),
            verbose: false,
        }
    }

    /// Create with verbose output (prints every tool call and model text)
    pub fn verbose() -> Self {
        Self {
            verbose: true,
            ..Self::new()
        }
    }

    fn session_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix:.bold.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn cycle_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{prefix:.bold.yellow} [{bar:30.yellow/dim}] {pos}/{len} {msg}")
            .map(|s| s.progress_chars("=>-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
    }

    fn session_label(kind: SessionKind) -> &'static str {
        match kind {
            SessionKind::Authoring => "✍️  Authoring",
            SessionKind::Evaluation => "🔎 Evaluation",
        }
    }

    fn with_session_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(guard) = self.session_bar.lock()
            && let Some(pb) = guard.as_ref()
        {
            f(pb);
        }
    }

    fn println(&self, line: String) {
        if self.multi.println(&line).is_err() {
            eprintln!("{}", line);
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionProgressNotifier for ProgressReporter {
    fn on_session_start(&self, kind: SessionKind, label: &str) {
        let pb = self.multi.add(ProgressBar::new_spinner());
        pb.set_style(Self::session_style());
        pb.set_prefix(Self::session_label(kind));
        pb.set_message(label.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));

        if let Ok(mut guard) = self.session_bar.lock()
            && let Some(previous) = guard.replace(pb)
        {
            previous.finish_and_clear();
        }
    }

    fn on_tool_turn(&self, _kind: SessionKind, turn: usize, max_turns: usize) {
        self.with_session_bar(|pb| pb.set_message(format!("turn {}/{}", turn, max_turns)));
    }

    fn on_tool_call(&self, tool_name: &str, args_preview: &str) {
        self.with_session_bar(|pb| pb.set_message(format!("Running: {}", tool_name)));
        if self.verbose {
            self.println(format!(
                "    {} {} {}",
                "🔧".dimmed(),
                tool_name.cyan(),
                preview(args_preview, 60).dimmed()
            ));
        }
    }

    fn on_tool_result(&self, tool_name: &str, success: bool, result_preview: &str) {
        if !self.verbose {
            return;
        }
        if success {
            self.println(format!("    {} {}", "✓".green(), tool_name.green()));
        } else {
            self.println(format!(
                "    {} {} {}",
                "✗".red(),
                tool_name.red(),
                result_preview.dimmed()
            ));
        }
    }

    fn on_llm_text(&self, text: &str) {
        if self.verbose {
            self.println(format!("    {} {}", "💭".dimmed(), preview(text, 100).dimmed()));
        }
    }

    fn on_authoring_state(&self, state: AuthoringState) {
        self.with_session_bar(|pb| pb.set_message(state.to_string()));
        if self.verbose {
            self.println(format!("  {} {}", "→".blue(), state.as_str().bold()));
        }
    }

    fn on_session_end(&self, kind: SessionKind, turns: usize) {
        if let Ok(mut guard) = self.session_bar.lock()
            && let Some(pb) = guard.take()
        {
            pb.finish_and_clear();
        }
        self.println(format!(
            "{} {} finished after {} tool turns",
            "✓".green(),
            kind.as_str().bold(),
            turns
        ));
    }

    fn on_cycle_start(&self, index: usize, total: usize) {
        let Ok(mut guard) = self.cycle_bar.lock() else {
            return;
        };
        let pb = guard.get_or_insert_with(|| {
            let pb = self.multi.add(ProgressBar::new(total as u64));
            pb.set_style(Self::cycle_style());
            pb.set_prefix("Simulation");
            pb
        });
        pb.set_message(format!("cycle {}", index));
    }

    fn on_cycle_end(&self, index: usize, success: bool, summary: &str) {
        let marker = if success { "✓".green() } else { "✗".red() };
        self.println(format!("{} cycle {}: {}", marker, index, summary));

        if let Ok(mut guard) = self.cycle_bar.lock() {
            let finished = guard.as_ref().is_some_and(|pb| {
                pb.inc(1);
                pb.length().is_some_and(|len| pb.position() >= len)
            });
            if finished && let Some(pb) = guard.take() {
                pb.finish_and_clear();
            }
        }
    }
}

/// Simple line-based progress on stderr (no fancy UI)
pub struct SimpleProgress;

impl SessionProgressNotifier for SimpleProgress {
    fn on_session_start(&self, kind: SessionKind, label: &str) {
        eprintln!("{} {} {}", "->".cyan(), kind.as_str().bold(), label);
    }

    fn on_tool_call(&self, tool_name: &str, _args_preview: &str) {
        eprintln!("  {} {}", "·".dimmed(), tool_name);
    }

    fn on_tool_result(&self, tool_name: &str, success: bool, result_preview: &str) {
        if !success {
            eprintln!("  {} {} {}", "x".red(), tool_name, result_preview);
        }
    }

    fn on_session_end(&self, kind: SessionKind, turns: usize) {
        eprintln!("  {} {} done ({} turns)", "v".green(), kind.as_str(), turns);
    }

    fn on_cycle_start(&self, index: usize, total: usize) {
        eprintln!("{} cycle {} ({}/{})", "=>".cyan(), index, index + 1, total);
    }

    fn on_cycle_end(&self, index: usize, success: bool, summary: &str) {
        if success {
            eprintln!("  {} cycle {}: {}", "v".green(), index, summary);
        } else {
            eprintln!("  {} cycle {}: {}", "x".red(), index, summary);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_bar_lifecycle() {
        let reporter = ProgressReporter::new();
        reporter.on_session_start(SessionKind::Authoring, "mainz");
        reporter.on_tool_turn(SessionKind::Authoring, 1, 40);
        reporter.on_authoring_state(AuthoringState::Drafting);
        assert!(reporter.session_bar.lock().unwrap().is_some());

        reporter.on_session_end(SessionKind::Authoring, 1);
        assert!(reporter.session_bar.lock().unwrap().is_none());
    }

    #[test]
    fn test_cycle_bar_finishes_on_last_cycle() {
        let reporter = ProgressReporter::new();
        for i in 0..2 {
            reporter.on_cycle_start(i, 2);
            reporter.on_cycle_end(i, i == 0, "ok");
        }
        assert!(reporter.cycle_bar.lock().unwrap().is_none());
    }
}
