//! Failing, interrupted and misdeclared jobs.

use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use wikimap_lib::interrupt::Interrupt;
use wikimap_lib::job::{Job, JobError, Outcome};
use wikimap_lib::path::AbstractPath;
use wikimap_lib::registry::JobRegistry;
use wikimap_lib::runner::Halt;

use super::common::{TestArchive, concat, outcomes};

fn half_writer(fail: Arc<AtomicBool>) -> Job {
  Job::new("HALF", move |ctx| {
    let first = ctx.output(0).ok_or_else(|| JobError::msg("no output"))?;
    fs::write(first, "partial")?;
    if fail.load(Ordering::SeqCst) {
      return Err(JobError::msg("disk on fire"));
    }
    let second = ctx.output(1).ok_or_else(|| JobError::msg("no output"))?;
    fs::write(second, "complete")?;
    Ok(())
  })
  .output(AbstractPath::new("first", "half/one.txt"))
  .output(AbstractPath::new("second", "half/two.txt"))
}

fn registry_with_failure(fail: Arc<AtomicBool>) -> JobRegistry {
  let mut registry = JobRegistry::new();
  registry
    .register(|| Job::new("SOURCE", concat).output(AbstractPath::new("src", "src.txt")))
    .register(move || half_writer(fail.clone()))
    .register(|| {
      Job::new("AFTER", concat)
        .input(AbstractPath::new("first", "half/one.txt"))
        .output(AbstractPath::new("after", "after.txt"))
    });
  registry
}

#[test]
fn failing_job_leaves_no_outputs_and_halts() {
  let archive = TestArchive::new();
  let registry = registry_with_failure(Arc::new(AtomicBool::new(true)));

  let (build, report) = archive.run_all(&registry, &[]);

  assert!(!report.is_success());
  assert!(matches!(&report.halt, Some(Halt::Failed { job, .. }) if job == "HALF"));
  assert_eq!(outcomes(&report), vec!["SOURCE=SUCCESS", "HALF=FAILURE", "AFTER=NOT_RUN"]);
  assert!(!archive.snapshot(0).join("half/one.txt").exists());
  assert!(!archive.snapshot(0).join("half/two.txt").exists());
  assert!(archive.snapshot(0).join("src.txt").exists());
  assert!(build.by_name("HALF").unwrap().log()[0].contains("disk on fire"));

  let record = archive.store().load_config(&archive.snapshot(0)).unwrap();
  assert!(record.contains("SOURCE"));
  assert!(!record.contains("HALF"));
  assert!(!record.contains("AFTER"));
}

#[test]
fn rerun_after_failure_reuses_completed_jobs() {
  let archive = TestArchive::new();
  let fail = Arc::new(AtomicBool::new(true));
  let registry = registry_with_failure(fail.clone());
  archive.run_all(&registry, &[]);

  fail.store(false, Ordering::SeqCst);
  let (_, report) = archive.run_all(&registry, &[]);

  assert!(report.is_success());
  assert_eq!(outcomes(&report), vec!["SOURCE=SKIPPED", "HALF=SUCCESS", "AFTER=SUCCESS"]);
  assert_eq!(
    fs::read_to_string(archive.snapshot(1).join("half/two.txt")).unwrap(),
    "complete"
  );
}

#[test]
fn undeclared_read_is_a_warning_not_a_failure() {
  let archive = TestArchive::new();
  let stray = archive.temp.path().join("stray.txt");
  fs::write(&stray, "stray").unwrap();

  let mut registry = JobRegistry::new();
  let read = stray.clone();
  registry
    .register(move || {
      let read = read.clone();
      Job::new("SNEAKY", move |ctx| {
        ctx.record(&read);
        let content = fs::read_to_string(&read)?;
        let out = ctx.output(0).ok_or_else(|| JobError::msg("no output"))?;
        fs::write(out, content)?;
        Ok(())
      })
      .output(AbstractPath::new("out", "out.txt"))
    })
    .register(|| {
      Job::new("NEXT", concat)
        .input(AbstractPath::new("out", "out.txt"))
        .output(AbstractPath::new("next", "next.txt"))
    });

  let (build, report) = archive.run_all(&registry, &[]);

  assert!(report.is_success());
  assert_eq!(outcomes(&report), vec!["SNEAKY=WARNING", "NEXT=SUCCESS"]);
  let log = build.by_name("SNEAKY").unwrap().log().join("\n");
  assert!(log.contains(&stray.display().to_string()), "{log}");
  assert!(report.summary.render().contains("Unspecified dependency of 'SNEAKY'"));
}

#[test]
fn interrupt_before_a_job_leaves_it_not_run() {
  let archive = TestArchive::new();
  let interrupt = Interrupt::new();
  let trigger = interrupt.clone();

  let mut registry = JobRegistry::new();
  registry
    .register(move || {
      let trigger = trigger.clone();
      Job::new("FIRST", move |ctx| {
        concat(ctx)?;
        trigger.trigger();
        Ok(())
      })
      .output(AbstractPath::new("first", "first.txt"))
    })
    .register(|| Job::new("SECOND", concat).output(AbstractPath::new("second", "second.txt")));

  let mut build = registry.build().unwrap();
  let everything = build.select("*").unwrap();
  build.plan(&everything, &Default::default()).unwrap();
  let report = archive.runner().with_interrupt(interrupt).run(&mut build).unwrap();

  assert!(report.is_interrupted());
  assert_eq!(report.summary.outcome_of("FIRST"), Some(Outcome::Success));
  assert_eq!(report.summary.outcome_of("SECOND"), Some(Outcome::NotRun));
  assert!(archive.snapshot(0).join("summary").exists());
}

#[test]
fn interrupt_inside_a_job_aborts_it() {
  let archive = TestArchive::new();
  let interrupt = Interrupt::new();
  let trigger = interrupt.clone();

  let mut registry = JobRegistry::new();
  registry.register(move || {
    let trigger = trigger.clone();
    Job::new("LONG", move |ctx| {
      let out = ctx.output(0).ok_or_else(|| JobError::msg("no output"))?;
      fs::write(out, "partial")?;
      trigger.trigger();
      ctx.check_interrupt()?;
      Ok(())
    })
    .output(AbstractPath::new("long", "long.txt"))
  });

  let mut build = registry.build().unwrap();
  let everything = build.select("*").unwrap();
  build.plan(&everything, &Default::default()).unwrap();
  let report = archive.runner().with_interrupt(interrupt).run(&mut build).unwrap();

  assert!(matches!(&report.halt, Some(Halt::Interrupted { job }) if job == "LONG"));
  assert_eq!(report.summary.outcome_of("LONG"), Some(Outcome::Aborted));
  assert!(!archive.snapshot(0).join("long.txt").exists());
}

#[test]
fn panicking_job_still_persists_record_and_summary() {
  let archive = TestArchive::new();
  let mut registry = JobRegistry::new();
  registry
    .register(|| Job::new("OK", concat).output(AbstractPath::new("ok", "ok.txt")))
    .register(|| {
      Job::new("BOOM", |_ctx| panic!("unexpected layout")).output(AbstractPath::new("boom", "boom.txt"))
    })
    .register(|| Job::new("LATER", concat).output(AbstractPath::new("later", "later.txt")));

  let (_, report) = archive.run_all(&registry, &[]);

  assert!(matches!(&report.halt, Some(Halt::Failed { job, error: JobError::Panicked(_) }) if job == "BOOM"));
  assert_eq!(outcomes(&report), vec!["OK=SUCCESS", "BOOM=FAILURE", "LATER=NOT_RUN"]);
  assert!(archive.snapshot(0).join("summary").exists());
  let record = archive.store().load_config(&archive.snapshot(0)).unwrap();
  assert!(record.contains("OK"));
  assert!(!record.contains("BOOM"));
}
