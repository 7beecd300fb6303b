#![forbid(unsafe_code)]

use std::time::{Duration, Instant};

use time::Date;

use crate::board::color::Palette;
use crate::board::model::{self, Note, Project, Task, TaskDraft, clamp_progress};
use crate::error::PmtuiError;

/// How long a validation warning stays visible before auto-dismissing.
pub const DEFAULT_WARNING_TTL: Duration = Duration::from_secs(20);

#[derive(Debug, Clone)]
pub struct Warning {
    pub message: String,
    pub until: Instant,
}

/// Non-done tasks split around a reference date. The comparison is strict
/// both ways, so a deadline equal to the reference date lands in neither
/// bucket.
#[derive(Debug, Default)]
pub struct Classified<'a> {
    pub past_due: Vec<&'a Task>,
    pub in_progress: Vec<&'a Task>,
    pub done: Vec<&'a Task>,
}

pub fn classify(tasks: &[Task], reference: Date) -> Classified<'_> {
    let mut out = Classified::default();
    for task in tasks {
        if task.done {
            out.done.push(task);
        } else if task.deadline > reference {
            out.in_progress.push(task);
        } else if task.deadline < reference {
            out.past_due.push(task);
        }
    }
    out
}

/// Mean progress across tasks, rounded to the nearest percent. Empty input
/// aggregates to 0.
#[must_use]
pub fn aggregate_progress(tasks: &[Task]) -> u8 {
    if tasks.is_empty() {
        return 0;
    }
    let sum: u32 = tasks.iter().map(|t| u32::from(t.progress)).sum();
    let mean = f64::from(sum) / tasks.len() as f64;
    clamp_progress(mean.round() as i64)
}

/// Stable two-way partition: unchecked notes first, checked notes after,
/// each group keeping its relative order.
#[must_use]
pub fn partition_notes(notes: Vec<Note>) -> Vec<Note> {
    let (mut unchecked, checked): (Vec<Note>, Vec<Note>) =
        notes.into_iter().partition(|n| !n.checked);
    unchecked.extend(checked);
    unchecked
}

/// In-memory task/note state for one project, plus the derived views the
/// screens render. All mutation is synchronous; state lives only as long as
/// the engine.
#[derive(Debug)]
pub struct TaskBoardEngine {
    project: Project,
    tasks: Vec<Task>,
    notes: Vec<Note>,
    palette: Palette,
    selected_task: Option<usize>,
    warning: Option<Warning>,
    warning_ttl: Duration,
}

impl TaskBoardEngine {
    #[must_use]
    pub fn new(project: Project, palette: Palette) -> Self {
        Self::with_warning_ttl(project, palette, DEFAULT_WARNING_TTL)
    }

    #[must_use]
    pub fn with_warning_ttl(project: Project, palette: Palette, warning_ttl: Duration) -> Self {
        Self {
            project,
            tasks: Vec::new(),
            notes: Vec::new(),
            palette,
            selected_task: None,
            warning: None,
            warning_ttl,
        }
    }

    #[must_use]
    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn project_mut(&mut self) -> &mut Project {
        &mut self.project
    }

    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    #[must_use]
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    #[must_use]
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    #[must_use]
    pub fn classified(&self, reference: Date) -> Classified<'_> {
        classify(&self.tasks, reference)
    }

    #[must_use]
    pub fn progress(&self) -> u8 {
        aggregate_progress(&self.tasks)
    }

    /// Validates in field order (name, deadline, departments), warns on the
    /// first unmet precondition, otherwise appends the resolved task and
    /// clears any pending warning.
    pub fn add_task(&mut self, draft: &TaskDraft) -> Result<&Task, PmtuiError> {
        let deadline = match self.validate_draft(draft) {
            Ok(deadline) => deadline,
            Err(e) => {
                self.warn(e.to_string());
                return Err(e);
            }
        };

        let task = Task {
            id: Task::new_id(),
            name: draft.name.trim().to_owned(),
            departments: draft.departments.clone(),
            color: self.palette.background_for(&draft.departments).to_owned(),
            deadline,
            created_at: model::today(),
            done: draft.done,
            progress: draft.progress.min(100),
        };
        let idx = self.tasks.len();
        self.tasks.push(task);
        self.clear_warning();
        Ok(&self.tasks[idx])
    }

    fn validate_draft(&self, draft: &TaskDraft) -> Result<Date, PmtuiError> {
        if draft.name.trim().is_empty() {
            return Err(PmtuiError::MissingField("task name"));
        }
        let deadline = draft.deadline.ok_or(PmtuiError::MissingField("deadline"))?;
        if draft.departments.is_empty() {
            return Err(PmtuiError::MissingField("department"));
        }
        Ok(deadline)
    }

    /// Flips `done`. Unknown ids are a silent no-op.
    pub fn toggle_task_done(&mut self, task_id: &str) {
        if let Some(task) = self.tasks.iter_mut().find(|t| t.id == task_id) {
            task.done = !task.done;
        }
    }

    pub fn select_task_for_edit(&mut self, task_id: &str) -> Result<&Task, PmtuiError> {
        match self.tasks.iter().position(|t| t.id == task_id) {
            Some(idx) => {
                self.selected_task = Some(idx);
                Ok(&self.tasks[idx])
            }
            None => {
                let err = PmtuiError::TaskNotFound(task_id.to_owned());
                self.warn(err.to_string());
                Err(err)
            }
        }
    }

    #[must_use]
    pub fn selected_task(&self) -> Option<&Task> {
        self.selected_task.and_then(|idx| self.tasks.get(idx))
    }

    pub fn clear_selection(&mut self) {
        self.selected_task = None;
    }

    /// Replaces the editable fields of the previously selected task. Id and
    /// creation date are preserved, progress is clamped, the color follows
    /// the (possibly changed) first department.
    pub fn save_edited_task(&mut self, draft: &TaskDraft) -> Result<&Task, PmtuiError> {
        let Some(idx) = self.selected_task.filter(|i| *i < self.tasks.len()) else {
            let err = PmtuiError::NoTaskSelected;
            self.warn(err.to_string());
            return Err(err);
        };

        let color = self.palette.background_for(&draft.departments).to_owned();
        let task = &mut self.tasks[idx];
        task.name = draft.name.clone();
        task.departments = draft.departments.clone();
        task.color = color;
        if let Some(deadline) = draft.deadline {
            task.deadline = deadline;
        }
        task.done = draft.done;
        task.progress = draft.progress.min(100);

        self.selected_task = None;
        self.clear_warning();
        Ok(&self.tasks[idx])
    }

    /// Prepends a note dated today. Whitespace-only input is discarded
    /// without an error.
    pub fn add_note(&mut self, text: &str) -> Option<&Note> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let note = Note {
            id: Note::new_id(),
            text: text.to_owned(),
            date: model::today(),
            checked: false,
        };
        self.notes.insert(0, note);
        self.notes.first()
    }

    /// Flips `checked`, then repartitions so unchecked notes come first.
    /// Unknown ids are a silent no-op.
    pub fn toggle_note_checked(&mut self, note_id: &str) {
        let Some(note) = self.notes.iter_mut().find(|n| n.id == note_id) else {
            return;
        };
        note.checked = !note.checked;
        self.notes = partition_notes(std::mem::take(&mut self.notes));
    }

    /// In-place text replacement; display order is untouched.
    pub fn edit_note(&mut self, note_id: &str, text: &str) -> Result<(), PmtuiError> {
        match self.notes.iter_mut().find(|n| n.id == note_id) {
            Some(note) => {
                note.text = text.to_owned();
                Ok(())
            }
            None => Err(PmtuiError::NoteNotFound(note_id.to_owned())),
        }
    }

    /// Sets (or replaces) the transient warning and restarts its dismissal
    /// clock.
    pub fn warn(&mut self, message: impl Into<String>) {
        self.warning = Some(Warning {
            message: message.into(),
            until: Instant::now() + self.warning_ttl,
        });
    }

    pub fn clear_warning(&mut self) {
        self.warning = None;
    }

    /// Drops the warning once its dismissal time has passed. Called from the
    /// event loop on every tick.
    pub fn expire_warning(&mut self, now: Instant) {
        if let Some(w) = &self.warning
            && now >= w.until
        {
            self.warning = None;
        }
    }

    #[must_use]
    pub fn warning(&self) -> Option<&str> {
        self.warning.as_ref().map(|w| w.message.as_str())
    }
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::*;
    use crate::board::color::FALLBACK_COLOR;

    fn palette() -> Palette {
        Palette::new(
            vec![
                ("Design Electric".to_owned(), "#33C1FF".to_owned()),
                ("Purchasing".to_owned(), "#004f2fff".to_owned()),
            ],
            FALLBACK_COLOR,
        )
    }

    fn engine() -> TaskBoardEngine {
        let project = Project {
            id: "1".to_owned(),
            name: "Bridge Structural Analysis".to_owned(),
            description: String::new(),
            deadline: None,
            budget: None,
            progress: None,
            departments: Vec::new(),
        };
        TaskBoardEngine::new(project, palette())
    }

    fn task(name: &str, deadline: Date, done: bool, progress: u8) -> Task {
        Task {
            id: Task::new_id(),
            name: name.to_owned(),
            departments: vec!["Design Electric".to_owned()],
            color: "#33C1FF".to_owned(),
            deadline,
            created_at: date!(2025 - 11 - 01),
            done,
            progress,
        }
    }

    fn draft(name: &str, departments: &[&str], deadline: Option<Date>) -> TaskDraft {
        TaskDraft {
            name: name.to_owned(),
            departments: departments.iter().map(|d| (*d).to_owned()).collect(),
            deadline,
            progress: 0,
            done: false,
        }
    }

    #[test]
    fn classify_partitions_non_done_tasks_without_overlap() {
        let reference = date!(2025 - 11 - 20);
        let tasks = vec![
            task("late", date!(2025 - 11 - 10), false, 0),
            task("ahead", date!(2025 - 12 - 01), false, 0),
            task("finished late", date!(2025 - 11 - 10), true, 100),
        ];
        let buckets = classify(&tasks, reference);
        assert_eq!(buckets.past_due.len(), 1);
        assert_eq!(buckets.past_due[0].name, "late");
        assert_eq!(buckets.in_progress.len(), 1);
        assert_eq!(buckets.in_progress[0].name, "ahead");
        // Done wins over the deadline, whatever it is.
        assert_eq!(buckets.done.len(), 1);
        assert_eq!(buckets.done[0].name, "finished late");
    }

    #[test]
    fn same_day_deadline_falls_in_neither_bucket() {
        let reference = date!(2025 - 11 - 20);
        let tasks = vec![task("due today", reference, false, 0)];
        let buckets = classify(&tasks, reference);
        assert!(buckets.past_due.is_empty());
        assert!(buckets.in_progress.is_empty());
        assert!(buckets.done.is_empty());
    }

    #[test]
    fn aggregate_progress_is_rounded_mean() {
        assert_eq!(aggregate_progress(&[]), 0);
        let tasks = vec![
            task("a", date!(2025 - 12 - 01), false, 40),
            task("b", date!(2025 - 12 - 01), false, 60),
        ];
        assert_eq!(aggregate_progress(&tasks), 50);
        let tasks = vec![
            task("a", date!(2025 - 12 - 01), false, 33),
            task("b", date!(2025 - 12 - 01), false, 33),
            task("c", date!(2025 - 12 - 01), false, 34),
        ];
        // 100 / 3 = 33.33 rounds down.
        assert_eq!(aggregate_progress(&tasks), 33);
    }

    #[test]
    fn add_task_validates_name_first() {
        let mut eng = engine();
        // Everything else valid; name still decides.
        let err = eng
            .add_task(&draft("  ", &["Design Electric"], Some(date!(2025 - 12 - 01))))
            .unwrap_err();
        assert!(matches!(err, PmtuiError::MissingField("task name")));
        assert!(eng.warning().is_some());

        let err = eng.add_task(&draft("Wire harness", &["Design Electric"], None));
        assert!(matches!(
            err.unwrap_err(),
            PmtuiError::MissingField("deadline")
        ));

        let err = eng.add_task(&draft("Wire harness", &[], Some(date!(2025 - 12 - 01))));
        assert!(matches!(
            err.unwrap_err(),
            PmtuiError::MissingField("department")
        ));
        assert!(eng.tasks().is_empty());
    }

    #[test]
    fn add_task_resolves_color_and_clears_warning() {
        let mut eng = engine();
        eng.warn("stale warning");
        let added = eng
            .add_task(&draft(
                "Wire harness",
                &["Design Electric"],
                Some(date!(2025 - 12 - 01)),
            ))
            .unwrap();
        assert_eq!(added.color, "#33C1FF");
        assert_eq!(added.progress, 0);
        assert!(!added.done);
        assert!(eng.warning().is_none());

        let unknown = eng
            .add_task(&draft("Casting", &["Forging"], Some(date!(2025 - 12 - 02))))
            .unwrap()
            .clone();
        assert_eq!(unknown.color, FALLBACK_COLOR);
        // Insertion order preserved.
        assert_eq!(eng.tasks()[0].name, "Wire harness");
        assert_eq!(eng.tasks()[1].name, "Casting");
    }

    #[test]
    fn toggle_task_done_is_silent_on_unknown_id() {
        let mut eng = engine();
        eng.add_task(&draft(
            "Wire harness",
            &["Design Electric"],
            Some(date!(2025 - 12 - 01)),
        ))
        .unwrap();
        let id = eng.tasks()[0].id.clone();

        eng.toggle_task_done("missing");
        assert!(!eng.tasks()[0].done);
        assert!(eng.warning().is_none());

        eng.toggle_task_done(&id);
        assert!(eng.tasks()[0].done);
        eng.toggle_task_done(&id);
        assert!(!eng.tasks()[0].done);
    }

    #[test]
    fn save_edited_task_requires_selection() {
        let mut eng = engine();
        let err = eng
            .save_edited_task(&draft(
                "x",
                &["Design Electric"],
                Some(date!(2025 - 12 - 01)),
            ))
            .unwrap_err();
        assert!(matches!(err, PmtuiError::NoTaskSelected));
        assert!(eng.warning().is_some());
    }

    #[test]
    fn edit_flow_preserves_id_and_reresolves_color() {
        let mut eng = engine();
        eng.add_task(&draft(
            "Wire harness",
            &["Design Electric"],
            Some(date!(2025 - 12 - 01)),
        ))
        .unwrap();
        let id = eng.tasks()[0].id.clone();
        let created_at = eng.tasks()[0].created_at;

        eng.select_task_for_edit(&id).unwrap();
        let mut patch = draft("Wire harness v2", &["Purchasing"], None);
        patch.progress = 150u8.min(100);
        let saved = eng.save_edited_task(&patch).unwrap();
        assert_eq!(saved.id, id);
        assert_eq!(saved.created_at, created_at);
        assert_eq!(saved.name, "Wire harness v2");
        assert_eq!(saved.color, "#004f2fff");
        // Deadline untouched when the draft leaves it empty.
        assert_eq!(saved.deadline, date!(2025 - 12 - 01));
        assert_eq!(saved.progress, 100);
        assert!(eng.selected_task().is_none());
    }

    #[test]
    fn select_unknown_task_reports_and_warns() {
        let mut eng = engine();
        let err = eng.select_task_for_edit("missing").unwrap_err();
        assert!(matches!(err, PmtuiError::TaskNotFound(_)));
        assert!(eng.warning().is_some());
    }

    #[test]
    fn empty_notes_are_discarded() {
        let mut eng = engine();
        assert!(eng.add_note("   ").is_none());
        assert!(eng.add_note("").is_none());
        assert!(eng.notes().is_empty());
    }

    #[test]
    fn notes_are_prepended_most_recent_first() {
        let mut eng = engine();
        eng.add_note("first");
        eng.add_note("second");
        assert_eq!(eng.notes()[0].text, "second");
        assert_eq!(eng.notes()[1].text, "first");
    }

    #[test]
    fn checked_notes_sink_and_double_toggle_restores_order() {
        let mut eng = engine();
        eng.add_note("c");
        eng.add_note("b");
        eng.add_note("a");
        let texts = |eng: &TaskBoardEngine| {
            eng.notes()
                .iter()
                .map(|n| n.text.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(texts(&eng), ["a", "b", "c"]);

        let b_id = eng.notes()[1].id.clone();
        eng.toggle_note_checked(&b_id);
        assert_eq!(texts(&eng), ["a", "c", "b"]);
        assert!(eng.notes()[2].checked);

        eng.toggle_note_checked(&b_id);
        assert_eq!(texts(&eng), ["a", "c", "b"]);
        assert!(!eng.notes()[2].checked);

        // Unchecking restored the flag; re-checking "a" then "b" keeps each
        // group's relative order.
        let a_id = eng.notes()[0].id.clone();
        eng.toggle_note_checked(&a_id);
        eng.toggle_note_checked(&b_id);
        assert_eq!(texts(&eng), ["c", "a", "b"]);
    }

    #[test]
    fn edit_note_replaces_text_without_reordering() {
        let mut eng = engine();
        eng.add_note("old");
        let id = eng.notes()[0].id.clone();
        eng.edit_note(&id, "new").unwrap();
        assert_eq!(eng.notes()[0].text, "new");

        let err = eng.edit_note("missing", "x").unwrap_err();
        assert!(matches!(err, PmtuiError::NoteNotFound(_)));
    }

    #[test]
    fn warning_expires_after_ttl_and_is_replaced_by_newer_one() {
        let project = engine().project().clone();
        let mut eng = TaskBoardEngine::with_warning_ttl(project, palette(), Duration::ZERO);
        eng.warn("first");
        assert_eq!(eng.warning(), Some("first"));

        // Replacement swaps the message and restarts the clock.
        eng.warn("second");
        assert_eq!(eng.warning(), Some("second"));

        eng.expire_warning(Instant::now() + Duration::from_millis(1));
        assert!(eng.warning().is_none());
    }

    #[test]
    fn warning_survives_until_its_dismissal_time() {
        let mut eng = engine();
        eng.warn("hold on");
        eng.expire_warning(Instant::now());
        assert_eq!(eng.warning(), Some("hold on"));
    }
}
