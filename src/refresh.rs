//! Refresh-after-mutation cycle.
//!
//! A mutation is one request. When it succeeds, the list it touched (the
//! exercises of its date, or the template book) is fetched again and the view
//! is rebuilt from that response alone. Nothing is patched optimistically and
//! nothing is retried. Overlapping cycles are not ordered against each other:
//! whichever response arrives last is what ends up on screen.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use chrono::NaiveDate;

use crate::api::{date_segment, Backend};
use crate::error::ApiError;
use crate::models::{CalendarDays, Credentials, Exercise, Progression, TemplateBook, WorkoutSet};

#[derive(Clone, Debug, PartialEq)]
pub enum Mutation {
    AddExercise {
        date: NaiveDate,
        name: String,
    },
    DeleteExercise {
        date: NaiveDate,
        exercise: String,
    },
    AddSet {
        date: NaiveDate,
        exercise: String,
        set: WorkoutSet,
    },
    DeleteSet {
        date: NaiveDate,
        exercise: String,
        index: usize,
    },
    ApplyTemplate {
        date: NaiveDate,
        template: String,
    },
    AddTemplate {
        name: String,
        exercises: Vec<String>,
    },
    EditTemplate {
        name: String,
        exercises: Vec<String>,
    },
    DeleteTemplate {
        name: String,
    },
}

/// The list a mutation invalidates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshKey {
    Date(NaiveDate),
    Templates,
}

impl Mutation {
    pub fn key(&self) -> RefreshKey {
        match self {
            Mutation::AddExercise { date, .. }
            | Mutation::DeleteExercise { date, .. }
            | Mutation::AddSet { date, .. }
            | Mutation::DeleteSet { date, .. }
            | Mutation::ApplyTemplate { date, .. } => RefreshKey::Date(*date),
            Mutation::AddTemplate { .. }
            | Mutation::EditTemplate { .. }
            | Mutation::DeleteTemplate { .. } => RefreshKey::Templates,
        }
    }

    /// Message shown once the mutation went through, for the few actions that
    /// confirm themselves.
    pub fn success_notice(&self) -> Option<&'static str> {
        match self {
            Mutation::EditTemplate { .. } => Some("Template updated!"),
            _ => None,
        }
    }

    fn send(&self, backend: &dyn Backend) -> Result<(), ApiError> {
        match self {
            Mutation::AddExercise { date, name } => backend.add_exercise(*date, name),
            Mutation::DeleteExercise { date, exercise } => backend.delete_exercise(*date, exercise),
            Mutation::AddSet {
                date,
                exercise,
                set,
            } => backend.add_set(*date, exercise, set),
            Mutation::DeleteSet {
                date,
                exercise,
                index,
            } => backend.delete_set(*date, exercise, *index),
            Mutation::ApplyTemplate { date, template } => backend.apply_template(*date, template),
            Mutation::AddTemplate { name, exercises } => backend.add_template(name, exercises),
            Mutation::EditTemplate { name, exercises } => backend.edit_template(name, exercises),
            Mutation::DeleteTemplate { name } => backend.delete_template(name),
        }
    }
}

#[derive(Debug)]
pub enum Outcome {
    Workouts {
        date: NaiveDate,
        result: Result<Vec<Exercise>, ApiError>,
    },
    Templates(Result<TemplateBook, ApiError>),
    Applied(Mutation),
    Failed {
        mutation: Mutation,
        error: ApiError,
    },
    Calendar {
        year: i32,
        month: u32,
        result: Result<CalendarDays, ApiError>,
    },
    Progression {
        exercise: String,
        result: Result<Progression, ApiError>,
    },
    LoggedIn(Result<String, ApiError>),
    Registered(Result<(), ApiError>),
}

pub fn fetch(backend: &dyn Backend, key: RefreshKey) -> Outcome {
    match key {
        RefreshKey::Date(date) => {
            let result = backend.workouts(date);
            if let Err(err) = &result {
                log::error!("Loading workouts for {} failed: {}", date_segment(date), err);
            }
            Outcome::Workouts { date, result }
        }
        RefreshKey::Templates => {
            let result = backend.templates();
            if let Err(err) = &result {
                log::error!("Loading templates failed: {}", err);
            }
            Outcome::Templates(result)
        }
    }
}

/// One full cycle: the mutation, then (only if it succeeded) the refetch.
pub fn run_mutation(backend: &dyn Backend, mutation: Mutation) -> Vec<Outcome> {
    match mutation.send(backend) {
        Ok(()) => {
            let key = mutation.key();
            vec![Outcome::Applied(mutation), fetch(backend, key)]
        }
        Err(error) => {
            log::error!("{:?} failed: {}", mutation, error);
            vec![Outcome::Failed { mutation, error }]
        }
    }
}

type Waker = Arc<dyn Fn() + Send + Sync>;

/// Runs backend work on background threads and hands the outcomes back to
/// the UI thread, which drains them once per frame.
pub struct Dispatcher {
    backend: Arc<dyn Backend>,
    sender: Sender<Outcome>,
    receiver: Receiver<Outcome>,
    waker: Option<Waker>,
}

impl Dispatcher {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            backend,
            sender,
            receiver,
            waker: None,
        }
    }

    /// Called after each outcome is queued, so an idle UI wakes up to show it.
    pub fn with_waker(mut self, waker: impl Fn() + Send + Sync + 'static) -> Self {
        let waker: Waker = Arc::new(waker);
        self.waker = Some(waker);
        self
    }

    fn spawn<F>(&self, job: &str, work: F)
    where
        F: FnOnce(&dyn Backend) -> Vec<Outcome> + Send + 'static,
    {
        let backend = Arc::clone(&self.backend);
        let sender = self.sender.clone();
        let waker = self.waker.clone();
        let spawned = thread::Builder::new()
            .name(format!("backend-{}", job))
            .spawn(move || {
                for outcome in work(backend.as_ref()) {
                    if sender.send(outcome).is_err() {
                        return;
                    }
                    if let Some(waker) = &waker {
                        waker();
                    }
                }
            });
        if let Err(err) = spawned {
            log::error!("Failed to start {} job: {}", job, err);
        }
    }

    pub fn mutate(&self, mutation: Mutation) {
        self.spawn("mutation", move |backend| run_mutation(backend, mutation));
    }

    pub fn load_workouts(&self, date: NaiveDate) {
        self.spawn("workouts", move |backend| {
            vec![fetch(backend, RefreshKey::Date(date))]
        });
    }

    pub fn load_templates(&self) {
        self.spawn("templates", |backend| {
            vec![fetch(backend, RefreshKey::Templates)]
        });
    }

    pub fn load_calendar(&self, year: i32, month: u32) {
        self.spawn("calendar", move |backend| {
            vec![Outcome::Calendar {
                year,
                month,
                result: backend.calendar(year, month),
            }]
        });
    }

    pub fn load_progression(&self, exercise: String) {
        self.spawn("progression", move |backend| {
            let result = backend.progression(&exercise);
            vec![Outcome::Progression { exercise, result }]
        });
    }

    pub fn login(&self, credentials: Credentials) {
        self.spawn("login", move |backend| {
            vec![Outcome::LoggedIn(backend.login(&credentials))]
        });
    }

    pub fn register(&self, credentials: Credentials) {
        self.spawn("register", move |backend| {
            vec![Outcome::Registered(backend.register(&credentials))]
        });
    }

    /// Everything that has arrived since the last call, without blocking.
    pub fn drain(&self) -> Vec<Outcome> {
        self.receiver.try_iter().collect()
    }

    #[cfg(test)]
    fn next_outcome(&self, timeout: std::time::Duration) -> Option<Outcome> {
        self.receiver.recv_timeout(timeout).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct Store {
        days: BTreeMap<NaiveDate, Vec<Exercise>>,
        templates: BTreeMap<String, Vec<String>>,
        calls: Vec<String>,
        workouts_down: bool,
    }

    /// In-memory backend with the same rules as the real service.
    #[derive(Default)]
    struct FakeBackend {
        store: Mutex<Store>,
    }

    impl FakeBackend {
        fn calls(&self) -> Vec<String> {
            self.store.lock().unwrap().calls.clone()
        }

        fn with_store<T>(&self, call: String, f: impl FnOnce(&mut Store) -> T) -> T {
            let mut store = self.store.lock().unwrap();
            store.calls.push(call);
            f(&mut store)
        }
    }

    fn not_found(what: &str) -> ApiError {
        ApiError::Rejected(format!("{} not found.", what))
    }

    impl Backend for FakeBackend {
        fn login(&self, credentials: &Credentials) -> Result<String, ApiError> {
            self.with_store(format!("login {}", credentials.username), |_| {
                Ok("token".to_string())
            })
        }

        fn register(&self, credentials: &Credentials) -> Result<(), ApiError> {
            self.with_store(format!("register {}", credentials.username), |_| Ok(()))
        }

        fn workouts(&self, date: NaiveDate) -> Result<Vec<Exercise>, ApiError> {
            self.with_store(format!("workouts {}", date), |store| {
                if store.workouts_down {
                    return Err(ApiError::Network("connection refused".into()));
                }
                Ok(store.days.get(&date).cloned().unwrap_or_default())
            })
        }

        fn add_exercise(&self, date: NaiveDate, name: &str) -> Result<(), ApiError> {
            self.with_store(format!("add_exercise {} {}", date, name), |store| {
                let day = store.days.entry(date).or_default();
                if day.iter().any(|ex| ex.name == name) {
                    return Err(ApiError::Rejected(format!(
                        "Exercise '{}' already exists for {}",
                        name, date
                    )));
                }
                day.push(Exercise {
                    name: name.to_string(),
                    sets: Vec::new(),
                });
                Ok(())
            })
        }

        fn delete_exercise(&self, date: NaiveDate, exercise: &str) -> Result<(), ApiError> {
            self.with_store(format!("delete_exercise {} {}", date, exercise), |store| {
                let day = store.days.get_mut(&date).ok_or_else(|| not_found("Exercise"))?;
                let before = day.len();
                day.retain(|ex| ex.name != exercise);
                if day.len() == before {
                    return Err(not_found("Exercise"));
                }
                Ok(())
            })
        }

        fn add_set(&self, date: NaiveDate, exercise: &str, set: &WorkoutSet) -> Result<(), ApiError> {
            self.with_store(format!("add_set {} {}", date, exercise), |store| {
                let ex = store
                    .days
                    .get_mut(&date)
                    .and_then(|day| day.iter_mut().find(|ex| ex.name == exercise))
                    .ok_or_else(|| not_found("Exercise"))?;
                ex.sets.push(set.clone());
                Ok(())
            })
        }

        fn delete_set(&self, date: NaiveDate, exercise: &str, index: usize) -> Result<(), ApiError> {
            self.with_store(format!("delete_set {} {} {}", date, exercise, index), |store| {
                let ex = store
                    .days
                    .get_mut(&date)
                    .and_then(|day| day.iter_mut().find(|ex| ex.name == exercise))
                    .ok_or_else(|| not_found("Exercise"))?;
                if index >= ex.sets.len() {
                    return Err(ApiError::Rejected("Set index out of range.".to_string()));
                }
                ex.sets.remove(index);
                Ok(())
            })
        }

        fn templates(&self) -> Result<TemplateBook, ApiError> {
            self.with_store("templates".to_string(), |store| {
                Ok(TemplateBook {
                    templates: store.templates.clone(),
                })
            })
        }

        fn add_template(&self, name: &str, exercises: &[String]) -> Result<(), ApiError> {
            self.with_store(format!("add_template {}", name), |store| {
                store.templates.insert(name.to_string(), exercises.to_vec());
                Ok(())
            })
        }

        fn edit_template(&self, name: &str, exercises: &[String]) -> Result<(), ApiError> {
            self.with_store(format!("edit_template {}", name), |store| {
                let template = store.templates.get_mut(name).ok_or_else(|| not_found("Template"))?;
                *template = exercises.to_vec();
                Ok(())
            })
        }

        fn delete_template(&self, name: &str) -> Result<(), ApiError> {
            self.with_store(format!("delete_template {}", name), |store| {
                store.templates.remove(name).map(drop).ok_or_else(|| not_found("Template"))
            })
        }

        fn apply_template(&self, date: NaiveDate, template: &str) -> Result<(), ApiError> {
            self.with_store(format!("apply_template {} {}", date, template), |store| {
                let names = store.templates.get(template).cloned().ok_or_else(|| not_found("Template"))?;
                let day = store.days.entry(date).or_default();
                for name in names {
                    if !day.iter().any(|ex| ex.name == name) {
                        day.push(Exercise { name, sets: Vec::new() });
                    }
                }
                Ok(())
            })
        }

        fn calendar(&self, year: i32, month: u32) -> Result<CalendarDays, ApiError> {
            self.with_store(format!("calendar {} {}", year, month), |store| {
                let days = store
                    .days
                    .iter()
                    .map(|(date, exercises)| (date_segment(*date), !exercises.is_empty()))
                    .collect();
                Ok(CalendarDays { days })
            })
        }

        fn progression(&self, exercise: &str) -> Result<Progression, ApiError> {
            self.with_store(format!("progression {}", exercise), |_| {
                Ok(Progression {
                    exercise_name: exercise.to_string(),
                    set_data: BTreeMap::new(),
                })
            })
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    #[test]
    fn successful_mutation_refetches_its_date() {
        let backend = FakeBackend::default();
        let mutation = Mutation::AddExercise {
            date: day(),
            name: "Squat".to_string(),
        };
        let outcomes = run_mutation(&backend, mutation.clone());

        assert_eq!(backend.calls(), vec!["add_exercise 2026-10-18 Squat", "workouts 2026-10-18"]);
        assert!(matches!(&outcomes[0], Outcome::Applied(m) if *m == mutation));
        match &outcomes[1] {
            Outcome::Workouts { date, result: Ok(exercises) } => {
                assert_eq!(*date, day());
                assert_eq!(exercises.len(), 1);
                assert_eq!(exercises[0].name, "Squat");
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn failed_mutation_does_not_refetch() {
        let backend = FakeBackend::default();
        let add = Mutation::AddExercise {
            date: day(),
            name: "Squat".to_string(),
        };
        run_mutation(&backend, add.clone());
        let outcomes = run_mutation(&backend, add);

        assert_eq!(outcomes.len(), 1);
        match &outcomes[0] {
            Outcome::Failed { error, .. } => {
                assert_eq!(error.to_string(), "Exercise 'Squat' already exists for 2026-10-18")
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(backend.calls().len(), 3);
    }

    #[test]
    fn set_mutations_address_sets_by_index() {
        let backend = FakeBackend::default();
        run_mutation(&backend, Mutation::AddExercise { date: day(), name: "Bench".into() });
        for reps in [8, 6] {
            run_mutation(
                &backend,
                Mutation::AddSet {
                    date: day(),
                    exercise: "Bench".into(),
                    set: WorkoutSet { reps, weight: 80.0 },
                },
            );
        }
        let outcomes = run_mutation(
            &backend,
            Mutation::DeleteSet {
                date: day(),
                exercise: "Bench".into(),
                index: 0,
            },
        );
        match &outcomes[1] {
            Outcome::Workouts { result: Ok(exercises), .. } => {
                assert_eq!(exercises[0].sets, vec![WorkoutSet { reps: 6, weight: 80.0 }]);
            }
            other => panic!("unexpected outcome {:?}", other),
        }

        let out_of_range = run_mutation(
            &backend,
            Mutation::DeleteSet {
                date: day(),
                exercise: "Bench".into(),
                index: 5,
            },
        );
        assert!(matches!(&out_of_range[0], Outcome::Failed { error: ApiError::Rejected(_), .. }));
    }

    #[test]
    fn template_mutations_refetch_templates() {
        let backend = FakeBackend::default();
        run_mutation(
            &backend,
            Mutation::AddTemplate {
                name: "Push".into(),
                exercises: vec!["Bench".into()],
            },
        );
        let edit = Mutation::EditTemplate {
            name: "Push".into(),
            exercises: vec!["Bench".into(), "Dips".into()],
        };
        assert_eq!(edit.success_notice(), Some("Template updated!"));
        let outcomes = run_mutation(&backend, edit);
        match &outcomes[1] {
            Outcome::Templates(Ok(book)) => {
                assert_eq!(book.templates["Push"], vec!["Bench", "Dips"]);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(backend.calls().last().map(String::as_str), Some("templates"));
    }

    #[test]
    fn applying_a_template_refreshes_the_date() {
        let backend = FakeBackend::default();
        run_mutation(
            &backend,
            Mutation::AddTemplate {
                name: "Legs".into(),
                exercises: vec!["Squat".into(), "Lunge".into()],
            },
        );
        let apply = Mutation::ApplyTemplate {
            date: day(),
            template: "Legs".into(),
        };
        assert_eq!(apply.key(), RefreshKey::Date(day()));
        let outcomes = run_mutation(&backend, apply);
        match &outcomes[1] {
            Outcome::Workouts { result: Ok(exercises), .. } => {
                let names: Vec<&str> = exercises.iter().map(|ex| ex.name.as_str()).collect();
                assert_eq!(names, vec!["Squat", "Lunge"]);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn refetch_failure_is_reported_after_the_applied_mutation() {
        let backend = FakeBackend::default();
        backend.store.lock().unwrap().workouts_down = true;
        let outcomes = run_mutation(&backend, Mutation::AddExercise { date: day(), name: "Row".into() });
        assert!(matches!(outcomes[0], Outcome::Applied(_)));
        assert!(matches!(
            outcomes[1],
            Outcome::Workouts { result: Err(ApiError::Network(_)), .. }
        ));
    }

    #[test]
    fn dispatcher_delivers_outcomes_and_wakes_the_ui() {
        let backend = Arc::new(FakeBackend::default());
        let wakes = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&wakes);
        let dispatcher = Dispatcher::new(backend.clone())
            .with_waker(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });

        dispatcher.mutate(Mutation::AddExercise { date: day(), name: "Deadlift".into() });
        let first = dispatcher.next_outcome(Duration::from_secs(5));
        let second = dispatcher.next_outcome(Duration::from_secs(5));

        assert!(matches!(first, Some(Outcome::Applied(_))));
        assert!(matches!(second, Some(Outcome::Workouts { result: Ok(_), .. })));
        // The waker fires right after each send, so give the last one a moment.
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while wakes.load(Ordering::SeqCst) < 2 && std::time::Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(wakes.load(Ordering::SeqCst), 2);
        assert!(dispatcher.drain().is_empty());
    }

    #[test]
    fn dispatcher_runs_login_off_thread() {
        let dispatcher = Dispatcher::new(Arc::new(FakeBackend::default()));
        dispatcher.login(Credentials {
            username: "lifter".into(),
            password: "pw".into(),
        });
        match dispatcher.next_outcome(Duration::from_secs(5)) {
            Some(Outcome::LoggedIn(Ok(token))) => assert_eq!(token, "token"),
            other => panic!("unexpected outcome {:?}", other),
        }
    }
}
