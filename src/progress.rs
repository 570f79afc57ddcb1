use indicatif::{ProgressBar, ProgressStyle};
use regex::Regex;
use std::io::{self, BufRead};
use std::sync::LazyLock;
use std::thread;
use std::time::Duration;

/// Delay between redraws when the bar jumps several percent at once.
pub const STEP_DELAY: Duration = Duration::from_millis(10);

static RE_KV: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\w+)=([\w\-\.:]+)$").expect("static progress regex")
});

/// One meaningful line of ffmpeg's `-progress` output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEvent {
    /// `out_time_ms`, which ffmpeg reports in microseconds.
    OutTime(u64),
    End,
}

pub fn parse_progress_line(line: &str) -> Option<ProgressEvent> {
    let caps = RE_KV.captures(line.trim())?;
    match (&caps[1], &caps[2]) {
        ("out_time_ms", val) => val.parse().ok().map(ProgressEvent::OutTime),
        ("progress", "end") => Some(ProgressEvent::End),
        _ => None,
    }
}

/// Where rendered percentages go.
pub trait ProgressSink {
    fn draw(&mut self, pct: u8);

    fn stage(&mut self, _label: &str) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PctRange {
    pub start: u8,
    pub end: u8,
}

impl PctRange {
    pub const FULL: PctRange = PctRange { start: 0, end: 100 };

    pub fn new(start: u8, end: u8) -> Self {
        let end = end.min(100);
        Self {
            start: start.min(end),
            end,
        }
    }
}

/// Last percentage drawn for one transcode stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressState {
    pub last_pct: u8,
}

impl ProgressState {
    pub fn starting_at(range: PctRange) -> Self {
        Self {
            last_pct: range.start,
        }
    }
}

/// Maps one ffmpeg process's output time onto its slice of the overall bar.
#[derive(Debug, Clone, Copy)]
pub struct StageMonitor {
    pub total_ms: u64,
    pub range: PctRange,
    pub step_delay: Duration,
}

impl StageMonitor {
    pub fn new(total_ms: u64, range: PctRange) -> Self {
        Self {
            total_ms,
            range,
            step_delay: STEP_DELAY,
        }
    }

    pub fn with_step_delay(mut self, step_delay: Duration) -> Self {
        self.step_delay = step_delay;
        self
    }

    pub fn target_pct(&self, out_time_us: u64) -> u8 {
        let fraction = if self.total_ms == 0 {
            1.0
        } else {
            (out_time_us as f64 / 1000.0 / self.total_ms as f64).min(1.0)
        };
        let span = f64::from(self.range.end.saturating_sub(self.range.start));
        self.range.start + (fraction * span).floor() as u8
    }

    fn step_to(&self, mut state: ProgressState, target: u8, sink: &mut impl ProgressSink) -> ProgressState {
        while state.last_pct < target {
            state.last_pct += 1;
            sink.draw(state.last_pct);
            if !self.step_delay.is_zero() {
                thread::sleep(self.step_delay);
            }
        }
        state
    }

    pub fn advance(
        &self,
        state: ProgressState,
        out_time_us: u64,
        sink: &mut impl ProgressSink,
    ) -> ProgressState {
        let target = self.target_pct(out_time_us);
        self.step_to(state, target, sink)
    }

    /// Reads progress lines until `progress=end` or EOF.
    pub fn consume<R: BufRead>(
        &self,
        reader: R,
        mut state: ProgressState,
        sink: &mut impl ProgressSink,
    ) -> io::Result<ProgressState> {
        for line in reader.lines() {
            match parse_progress_line(&line?) {
                Some(ProgressEvent::OutTime(us)) => state = self.advance(state, us, sink),
                Some(ProgressEvent::End) => break,
                None => {}
            }
        }
        Ok(state)
    }

    /// Pushes the bar to the end of this stage's range.
    pub fn complete(&self, state: ProgressState, sink: &mut impl ProgressSink) -> ProgressState {
        self.step_to(state, self.range.end, sink)
    }
}

pub struct ProgressUi {
    bar: ProgressBar,
}

impl ProgressUi {
    pub fn new() -> Self {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::with_template(
                "[{elapsed_precise}]  [{bar:60.cyan/bright-black}] {pos:>3}%\n{wide_msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
        );
        bar.set_message("Preparing.");
        Self { bar }
    }

    pub fn finish(&self) {
        self.bar.finish_with_message("Done");
    }

    pub fn abandon(&self) {
        self.bar.abandon();
    }
}

impl Default for ProgressUi {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for ProgressUi {
    fn draw(&mut self, pct: u8) {
        self.bar.set_position(u64::from(pct));
    }

    fn stage(&mut self, label: &str) {
        self.bar.set_message(label.to_string());
    }
}
