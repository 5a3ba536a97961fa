//! Command-line logger
use super::{Event, LogError, Loggable, Logger};
use std::collections::BTreeMap;
use std::io::{self, Write};
use yansi::Paint;

/// Logger that writes one line per episode and a final line per run.
///
/// Episode lines are built from the values named `episode`, `reward`, `average_reward`
/// and `rolling_window`; any other episode values are appended as `name value` pairs.
/// The run line reports `solved_at` or `exhausted_after`.
#[derive(Debug)]
pub struct DisplayLogger<W: Write = io::Stdout> {
    writer: W,
    episode: BTreeMap<&'static str, Loggable>,
    run: BTreeMap<&'static str, Loggable>,
    /// Kind of each name seen so far, used to reject incompatible values.
    kinds: BTreeMap<&'static str, &'static str>,
}

impl Default for DisplayLogger {
    fn default() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> DisplayLogger<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            episode: BTreeMap::new(),
            run: BTreeMap::new(),
            kinds: BTreeMap::new(),
        }
    }

    /// Consume the logger and return the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_episode(&mut self) -> io::Result<()> {
        let mut values = std::mem::take(&mut self.episode);
        let episode = values.remove("episode");
        let reward = values.remove("reward");
        let average = values.remove("average_reward");
        let window = values.remove("rolling_window");

        if let Some(episode) = episode {
            let label = DisplayValue(episode).prefixed("Episode ");
            write!(self.writer, "{}", Paint::fixed(35, label))?;
        }
        if let Some(reward) = reward {
            write!(self.writer, " Reward: {}", Paint::new(DisplayValue(reward)).bold())?;
        }
        if let Some(average) = average {
            write!(self.writer, " Average over ")?;
            if let Some(window) = window {
                write!(self.writer, "{} ", DisplayValue(window))?;
            }
            write!(self.writer, "episodes: {}", Paint::fixed(221, Rounded(average)))?;
        }
        for (name, value) in values {
            let entry = format!("{} {}", name, DisplayValue(value));
            write!(self.writer, "  {}", Paint::fixed(8, entry))?;
        }
        writeln!(self.writer)
    }

    fn write_run(&mut self) -> io::Result<()> {
        let values = std::mem::take(&mut self.run);
        if let Some(episode) = values.get("solved_at") {
            writeln!(
                self.writer,
                "{}",
                Paint::green(DisplayValue(*episode).prefixed(" Solved at episode: "))
            )?;
        } else if let Some(episodes) = values.get("exhausted_after") {
            writeln!(
                self.writer,
                "{}",
                Paint::yellow(format!(
                    " Not solved after {} episodes",
                    DisplayValue(*episodes)
                ))
            )?;
        }
        self.writer.flush()
    }
}

impl<W: Write> Logger for DisplayLogger<W> {
    fn log(&mut self, event: Event, name: &'static str, value: Loggable) -> Result<(), LogError> {
        if !matches!(value, Loggable::Nothing) {
            let expected = *self.kinds.entry(name).or_insert_with(|| value.kind());
            if expected != value.kind() {
                return Err(LogError::IncompatibleValue {
                    name,
                    value,
                    expected,
                });
            }
        }
        match event {
            Event::Episode => {
                self.episode.insert(name, value);
            }
            Event::Run => {
                self.run.insert(name, value);
            }
        }
        Ok(())
    }

    fn done(&mut self, event: Event) -> Result<(), LogError> {
        match event {
            Event::Episode => self.write_episode()?,
            Event::Run => self.write_run()?,
        }
        Ok(())
    }
}

/// Display a loggable value as plain text.
#[derive(Debug, Copy, Clone)]
struct DisplayValue(Loggable);

impl DisplayValue {
    fn prefixed(self, prefix: &str) -> String {
        format!("{}{}", prefix, self)
    }
}

impl std::fmt::Display for DisplayValue {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self.0 {
            Loggable::Nothing => f.write_str("-"),
            Loggable::Scalar(x) => {
                let magnitude = x.abs();
                if (magnitude >= 1e6 || magnitude <= 1e-4) && x != 0.0 {
                    write!(f, "{:.4e}", x)
                } else {
                    write!(f, "{}", x)
                }
            }
            Loggable::Index(i) => write!(f, "{}", i),
        }
    }
}

/// Display a scalar rounded to two decimal places.
#[derive(Debug, Copy, Clone)]
struct Rounded(Loggable);

impl std::fmt::Display for Rounded {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self.0 {
            Loggable::Scalar(x) => write!(f, "{:.2}", x),
            other => write!(f, "{}", DisplayValue(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(logger: DisplayLogger<Vec<u8>>) -> String {
        String::from_utf8(logger.into_inner()).unwrap()
    }

    #[test]
    fn writes_episode_line() {
        let mut logger = DisplayLogger::new(Vec::new());
        logger.log(Event::Episode, "episode", 7_u64.into()).unwrap();
        logger.log(Event::Episode, "reward", Loggable::Scalar(23.0)).unwrap();
        logger
            .log(Event::Episode, "average_reward", Loggable::Scalar(21.4567))
            .unwrap();
        logger.log(Event::Episode, "rolling_window", 100_u64.into()).unwrap();
        logger.done(Event::Episode).unwrap();
        let text = output(logger);
        assert!(text.contains("Episode 7"), "{}", text);
        assert!(text.contains(" Reward: "), "{}", text);
        assert!(text.contains("23"), "{}", text);
        assert!(text.contains("Average over 100 episodes: "), "{}", text);
        assert!(text.contains("21.46"), "{}", text);
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn episode_values_reset_between_lines() {
        let mut logger = DisplayLogger::new(Vec::new());
        logger.log(Event::Episode, "length", 5_u64.into()).unwrap();
        logger.done(Event::Episode).unwrap();
        logger.done(Event::Episode).unwrap();
        let text = output(logger);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("length 5"));
        assert!(!lines[1].contains("length"));
    }

    #[test]
    fn run_values_stay_out_of_episode_line() {
        let mut logger = DisplayLogger::new(Vec::new());
        logger.log(Event::Run, "exhausted_after", 3_u64.into()).unwrap();
        logger.log(Event::Episode, "episode", 2_u64.into()).unwrap();
        logger.done(Event::Episode).unwrap();
        logger.done(Event::Run).unwrap();
        let text = output(logger);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("Episode 2"), "{}", text);
        assert!(!lines[0].contains("exhausted_after"), "{}", text);
        assert!(lines[1].contains("Not solved after 3 episodes"), "{}", text);
    }

    #[test]
    fn writes_solved_line() {
        let mut logger = DisplayLogger::new(Vec::new());
        logger.log(Event::Run, "solved_at", 812_u64.into()).unwrap();
        logger.done(Event::Run).unwrap();
        assert!(output(logger).contains("Solved at episode: 812"));
    }

    #[test]
    fn rejects_incompatible_value() {
        let mut logger = DisplayLogger::new(Vec::new());
        logger.log(Event::Episode, "reward", Loggable::Scalar(1.0)).unwrap();
        let result = logger.log(Event::Episode, "reward", 1_u64.into());
        assert!(matches!(
            result,
            Err(LogError::IncompatibleValue {
                name: "reward",
                expected: "scalar",
                ..
            })
        ));
    }
}
