use std::time::{Duration, Instant};

/// Format an elapsed time for the run summary.
pub fn format_duration(elapsed: Duration) -> String
{
	let millis: u128 = elapsed.as_millis();

	if millis < 1
	{
		format!("{} µs", elapsed.as_micros())
	}
	else if millis < 1000
	{
		format!("{} ms", millis)
	}
	else if millis < 60_000
	{
		format!("{:.2} s", elapsed.as_secs_f64())
	}
	else
	{
		let secs: u64 = elapsed.as_secs();
		format!("{}m {:02}s", secs / 60, secs % 60)
	}
}

/// Named stage timings collected while a conversion runs.
#[derive(Debug)]
pub struct StageTimer
{
	started: Instant,
	stage_start: Instant,
	stages: Vec<(&'static str, Duration)>,
}

impl StageTimer
{
	pub fn start() -> Self
	{
		let now: Instant = Instant::now();
		Self
		{
			started: now,
			stage_start: now,
			stages: Vec::new(),
		}
	}

	/// Close the current stage under `name` and start the next one.
	pub fn lap(&mut self, name: &'static str) -> Duration
	{
		let now: Instant = Instant::now();
		let elapsed: Duration = now.duration_since(self.stage_start);
		self.stages.push((name, elapsed));
		self.stage_start = now;
		elapsed
	}

	pub fn stages(&self) -> &[(&'static str, Duration)]
	{
		&self.stages
	}

	pub fn total(&self) -> Duration
	{
		self.started.elapsed()
	}
}

#[cfg(test)]
mod tests
{
	use super::*;

	#[test]
	fn durations_pick_a_readable_unit()
	{
		assert_eq!(format_duration(Duration::from_micros(250)), "250 µs");
		assert_eq!(format_duration(Duration::from_millis(42)), "42 ms");
		assert_eq!(format_duration(Duration::from_millis(1530)), "1.53 s");
		assert_eq!(format_duration(Duration::from_secs(125)), "2m 05s");
	}

	#[test]
	fn laps_are_recorded_in_order()
	{
		let mut timer = StageTimer::start();
		timer.lap("load");
		timer.lap("map");
		let names: Vec<&str> = timer.stages().iter().map(|(name, _)| *name).collect();
		assert_eq!(names, vec!["load", "map"]);
		assert!(timer.total() >= timer.stages().iter().map(|(_, d)| *d).sum::<Duration>());
	}
}
