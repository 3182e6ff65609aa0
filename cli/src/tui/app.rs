use ratatui::widgets::TableState;
use taskdesk_core::{
    form_from_args, Priority, ServiceError, SortStrategy, Task, TaskApi, TaskFilter, TaskForm,
    TaskService, TaskStatus,
};

use crate::tui::form::{FormKind, FormState};

pub enum Mode {
    Normal,
    QuickAdd,
    Form(FormState),
    ConfirmDelete { id: i64, title: String },
    StatusPicker { id: i64, current: TaskStatus, selected: usize },
}

pub struct App<A: TaskApi> {
    pub service: TaskService<A>,
    pub tasks: Vec<Task>,
    pub state: TableState,
    pub mode: Mode,
    pub input: String,
    pub cursor_position: usize,
    pub filter: TaskFilter,
    pub sort: SortStrategy,
    /// Bumped after every successful mutation; the list reloads when it moves.
    pub refresh_key: u64,
    loaded_key: Option<u64>,
    pub load_error: Option<String>,
    pub flash: Option<String>,
    pub should_quit: bool,
    pub logout_requested: bool,
    pub session_lost: bool,
}

impl<A: TaskApi> App<A> {
    pub fn new(service: TaskService<A>) -> App<A> {
        App {
            service,
            tasks: Vec::new(),
            state: TableState::default(),
            mode: Mode::Normal,
            input: String::new(),
            cursor_position: 0,
            filter: TaskFilter::default(),
            sort: SortStrategy::default(),
            refresh_key: 0,
            loaded_key: None,
            load_error: None,
            flash: None,
            should_quit: false,
            logout_requested: false,
            session_lost: false,
        }
    }

    pub fn needs_reload(&self) -> bool {
        self.loaded_key != Some(self.refresh_key)
    }

    pub fn is_loading(&self) -> bool {
        self.needs_reload() && self.load_error.is_none()
    }

    pub fn bump_refresh(&mut self) {
        self.refresh_key += 1;
    }

    pub fn reload(&mut self) {
        self.loaded_key = Some(self.refresh_key);
        match self.service.load_tasks(self.filter, self.sort) {
            Ok(tasks) => {
                self.tasks = tasks;
                self.load_error = None;
                self.clamp_selection();
            }
            Err(err) => {
                if err.is_unauthorized() {
                    self.lose_session();
                }
                tracing::warn!(error = %err, "loading tasks failed");
                self.load_error = Some(err.to_string());
            }
        }
    }

    pub fn retry(&mut self) {
        self.load_error = None;
        self.bump_refresh();
    }

    fn clamp_selection(&mut self) {
        if self.tasks.is_empty() {
            self.state.select(None);
        } else {
            let i = self.state.selected().unwrap_or(0);
            self.state.select(Some(i.min(self.tasks.len() - 1)));
        }
    }

    fn lose_session(&mut self) {
        self.session_lost = true;
        self.should_quit = true;
    }

    /// Status-line report for a failed action.
    fn report(&mut self, what: &str, err: ServiceError) {
        if err.is_unauthorized() {
            self.lose_session();
        }
        tracing::warn!(error = %err, "{what} failed");
        self.flash = Some(format!("Error: could not {what}: {err}"));
    }

    pub fn selected_task(&self) -> Option<&Task> {
        self.state.selected().and_then(|i| self.tasks.get(i))
    }

    pub fn next(&mut self) {
        if self.tasks.is_empty() { return; }

        let i = match self.state.selected() {
            Some(i) => {
                if i >= self.tasks.len() - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        if self.tasks.is_empty() { return; }

        let i = match self.state.selected() {
            Some(i) => {
                if i == 0 {
                    self.tasks.len() - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }

    // --- create / edit modal ---

    pub fn open_create_form(&mut self) {
        self.flash = None;
        self.mode = Mode::Form(FormState::create());
    }

    pub fn open_edit_form(&mut self) {
        if let Some(task) = self.selected_task() {
            tracing::debug!(id = task.id, "opening edit form");
            let state = FormState::edit(task);
            self.flash = None;
            self.mode = Mode::Form(state);
        }
    }

    pub fn form_mut(&mut self) -> Option<&mut FormState> {
        match &mut self.mode {
            Mode::Form(state) => Some(state),
            _ => None,
        }
    }

    pub fn submit_form(&mut self) {
        let Mode::Form(state) = &mut self.mode else { return };

        let result = match state.kind {
            FormKind::Create => self.service.create_from_form(&state.form),
            FormKind::Edit { id } => self.service.update_from_form(id, &state.form),
        };

        match result {
            Ok(task) => {
                tracing::info!(id = task.id, "saved task");
                self.mode = Mode::Normal;
                self.bump_refresh();
            }
            Err(ServiceError::Validation(errors)) => {
                state.errors = errors;
                state.server_error = None;
            }
            Err(err) => {
                let unauthorized = err.is_unauthorized();
                state.errors = Default::default();
                state.server_error = Some(err.to_string());
                if unauthorized {
                    self.lose_session();
                }
            }
        }
    }

    /// Closing discards whatever was typed.
    pub fn close_modal(&mut self) {
        self.mode = Mode::Normal;
    }

    // --- status change ---

    pub fn open_status_picker(&mut self) {
        if let Some(task) = self.selected_task() {
            let selected = TaskStatus::ALL.iter().position(|s| *s == task.status).unwrap_or(0);
            let picker = Mode::StatusPicker { id: task.id, current: task.status, selected };
            self.mode = picker;
        }
    }

    pub fn picker_move(&mut self, down: bool) {
        if let Mode::StatusPicker { selected, .. } = &mut self.mode {
            let len = TaskStatus::ALL.len();
            *selected = if down { (*selected + 1) % len } else { (*selected + len - 1) % len };
        }
    }

    pub fn confirm_status(&mut self) {
        let Mode::StatusPicker { id, current, selected } = self.mode else { return };
        self.mode = Mode::Normal;

        let status = TaskStatus::ALL[selected];
        if status == current {
            return;
        }
        match self.service.change_status(id, status) {
            Ok(_) => self.bump_refresh(),
            Err(err) => self.report("update task status", err),
        }
    }

    // --- delete ---

    pub fn request_delete(&mut self) {
        if let Some(task) = self.selected_task() {
            let confirm = Mode::ConfirmDelete { id: task.id, title: task.title.clone() };
            self.mode = confirm;
        }
    }

    pub fn confirm_delete(&mut self) {
        let Mode::ConfirmDelete { id, .. } = self.mode else { return };
        self.mode = Mode::Normal;
        match self.service.delete(id) {
            Ok(()) => {
                tracing::info!(id, "deleted task");
                self.bump_refresh();
            }
            Err(err) => self.report("delete task", err),
        }
    }

    // --- quick add line ---

    pub fn enter_add_mode(&mut self) {
        self.mode = Mode::QuickAdd;
        self.input.clear();
        self.cursor_position = 0;
    }

    pub fn input_char(&mut self, c: char) {
        let byte_index = self.input.chars().take(self.cursor_position).map(|c| c.len_utf8()).sum();
        self.input.insert(byte_index, c);
        self.cursor_position += 1;
    }

    pub fn delete_char(&mut self) {
        if self.cursor_position > 0 {
            let byte_index: usize = self
                .input
                .chars()
                .take(self.cursor_position - 1)
                .map(|c| c.len_utf8())
                .sum();
            self.input.remove(byte_index);
            self.cursor_position -= 1;
        }
    }

    pub fn move_cursor_left(&mut self) {
        if self.cursor_position > 0 {
            self.cursor_position -= 1;
        }
    }

    pub fn move_cursor_right(&mut self) {
        if self.cursor_position < self.input.chars().count() {
            self.cursor_position += 1;
        }
    }

    pub fn submit_quick_add(&mut self) {
        let args: Vec<String> = self.input.split_whitespace().map(|s| s.to_string()).collect();
        self.input.clear();
        self.cursor_position = 0;
        self.mode = Mode::Normal;

        if args.is_empty() {
            return;
        }

        let form = match form_from_args(&args, TaskForm::default()) {
            Ok(form) => form,
            Err(e) => {
                self.flash = Some(format!("Error: {e}"));
                return;
            }
        };
        match self.service.create_from_form(&form) {
            Ok(_) => self.bump_refresh(),
            Err(err) => self.report("create task", err),
        }
    }

    // --- list view options ---

    pub fn cycle_status_filter(&mut self) {
        self.filter.status = cycle_option(self.filter.status, &TaskStatus::ALL);
        self.bump_refresh();
    }

    pub fn cycle_priority_filter(&mut self) {
        self.filter.priority = cycle_option(self.filter.priority, &Priority::ALL);
        self.bump_refresh();
    }

    pub fn cycle_sort(&mut self) {
        self.sort = self.sort.next();
        self.bump_refresh();
    }

    pub fn request_logout(&mut self) {
        self.logout_requested = true;
        self.should_quit = true;
    }
}

/// None -> first -> ... -> last -> None
fn cycle_option<T: Copy + PartialEq>(current: Option<T>, all: &[T]) -> Option<T> {
    match current {
        None => all.first().copied(),
        Some(v) => {
            let pos = all.iter().position(|x| *x == v).unwrap_or(all.len());
            all.get(pos + 1).copied()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use taskdesk_core::{ApiError, CreateTaskData, Field, UpdateTaskData};

    #[derive(Default)]
    struct FakeApi {
        tasks: RefCell<Vec<Task>>,
        fail_with: RefCell<Option<u16>>,
        calls: RefCell<Vec<String>>,
    }

    fn task(id: i64, title: &str, status: TaskStatus) -> Task {
        Task {
            id,
            title: title.to_string(),
            description: None,
            status,
            priority: Priority::Medium,
            due_date: None,
            created_at: "2025-01-01T00:00:00".to_string(),
            updated_at: "2025-01-01T00:00:00".to_string(),
        }
    }

    impl FakeApi {
        fn check(&self, call: String) -> Result<(), ApiError> {
            self.calls.borrow_mut().push(call);
            match *self.fail_with.borrow() {
                Some(401) => Err(ApiError::Unauthorized),
                Some(status) => Err(ApiError::Status { status, message: format!("boom {status}") }),
                None => Ok(()),
            }
        }
    }

    impl TaskApi for FakeApi {
        fn get_tasks(&self) -> Result<Vec<Task>, ApiError> {
            self.check("list".into())?;
            Ok(self.tasks.borrow().clone())
        }

        fn get_task_by_id(&self, id: i64) -> Result<Task, ApiError> {
            self.check(format!("get {id}"))?;
            self.tasks.borrow().iter().find(|t| t.id == id).cloned()
                .ok_or(ApiError::Status { status: 404, message: "missing".into() })
        }

        fn create_task(&self, data: &CreateTaskData) -> Result<Task, ApiError> {
            self.check(format!("create {}", data.title))?;
            let id = self.tasks.borrow().len() as i64 + 1;
            let created = task(id, &data.title, data.status.unwrap_or_default());
            self.tasks.borrow_mut().push(created.clone());
            Ok(created)
        }

        fn update_task(&self, id: i64, data: &UpdateTaskData) -> Result<Task, ApiError> {
            self.check(format!("update {id}"))?;
            let mut tasks = self.tasks.borrow_mut();
            let t = tasks.iter_mut().find(|t| t.id == id).expect("task exists");
            if let Some(title) = &data.title {
                t.title = title.clone();
            }
            Ok(t.clone())
        }

        fn delete_task(&self, id: i64) -> Result<(), ApiError> {
            self.check(format!("delete {id}"))?;
            self.tasks.borrow_mut().retain(|t| t.id != id);
            Ok(())
        }

        fn update_task_status(&self, id: i64, status: TaskStatus) -> Result<Task, ApiError> {
            self.check(format!("status {id} {status:?}"))?;
            let mut tasks = self.tasks.borrow_mut();
            let t = tasks.iter_mut().find(|t| t.id == id).expect("task exists");
            t.status = status;
            Ok(t.clone())
        }
    }

    fn app_with(tasks: Vec<Task>) -> App<FakeApi> {
        let api = FakeApi::default();
        *api.tasks.borrow_mut() = tasks;
        let mut app = App::new(TaskService::new(api));
        app.reload();
        app
    }

    fn two_pending() -> Vec<Task> {
        vec![task(1, "a", TaskStatus::Pending), task(2, "b", TaskStatus::Pending)]
    }

    fn calls(app: &App<FakeApi>) -> Vec<String> {
        app.service.api().calls.borrow().clone()
    }

    #[test]
    fn initial_state_needs_a_load() {
        let app = App::new(TaskService::new(FakeApi::default()));
        assert!(app.needs_reload());
        assert!(app.is_loading());
    }

    #[test]
    fn reload_selects_first_task() {
        let app = app_with(two_pending());
        assert!(!app.needs_reload());
        assert_eq!(app.selected_task().map(|t| t.id), Some(1));
    }

    #[test]
    fn load_failure_is_shown_and_retry_reloads() {
        let mut app = app_with(vec![task(1, "a", TaskStatus::Pending)]);
        *app.service.api().fail_with.borrow_mut() = Some(500);
        app.bump_refresh();
        app.reload();
        assert_eq!(app.load_error.as_deref(), Some("boom 500"));
        assert!(!app.is_loading());

        *app.service.api().fail_with.borrow_mut() = None;
        app.retry();
        assert!(app.needs_reload());
        app.reload();
        assert_eq!(app.load_error, None);
    }

    #[test]
    fn create_form_validation_keeps_modal_open() {
        let mut app = app_with(vec![]);
        app.open_create_form();
        app.submit_form();

        let Mode::Form(state) = &app.mode else { panic!("form should stay open") };
        assert_eq!(state.errors.for_field(Field::Title), Some("Title is required"));
        assert_eq!(calls(&app), vec!["list".to_string()]);
    }

    #[test]
    fn create_form_success_closes_and_refreshes() {
        let mut app = app_with(vec![]);
        app.open_create_form();
        for c in "Water plants".chars() {
            app.form_mut().unwrap().input_char(c);
        }
        let before = app.refresh_key;
        app.submit_form();

        assert!(matches!(app.mode, Mode::Normal));
        assert_eq!(app.refresh_key, before + 1);
        app.reload();
        assert_eq!(app.tasks.len(), 1);
        assert_eq!(app.tasks[0].title, "Water plants");
    }

    #[test]
    fn server_error_stays_inside_modal() {
        let mut app = app_with(vec![task(1, "a", TaskStatus::Pending)]);
        app.open_edit_form();
        *app.service.api().fail_with.borrow_mut() = Some(400);
        app.submit_form();

        let Mode::Form(state) = &app.mode else { panic!("form should stay open") };
        assert_eq!(state.server_error.as_deref(), Some("boom 400"));
        assert_eq!(state.kind, FormKind::Edit { id: 1 });
    }

    #[test]
    fn edit_form_is_prefilled() {
        let mut app = app_with(vec![task(1, "Draft", TaskStatus::InProgress)]);
        app.open_edit_form();
        let state = app.form_mut().unwrap();
        assert_eq!(state.form.title, "Draft");
        assert_eq!(state.form.status, TaskStatus::InProgress);
    }

    #[test]
    fn status_picker_patches_only_on_change() {
        let mut app = app_with(vec![task(1, "a", TaskStatus::Pending)]);
        app.open_status_picker();
        app.confirm_status();
        assert_eq!(calls(&app), vec!["list".to_string()]);

        app.open_status_picker();
        app.picker_move(true);
        app.picker_move(true);
        app.confirm_status();
        assert_eq!(calls(&app).last().map(String::as_str), Some("status 1 Completed"));
        assert!(app.needs_reload());
    }

    #[test]
    fn delete_requires_confirmation_and_clamps_selection() {
        let mut app = app_with(two_pending());
        app.next();
        app.request_delete();
        assert!(matches!(app.mode, Mode::ConfirmDelete { id: 2, .. }));
        app.close_modal();
        assert_eq!(calls(&app).len(), 1);

        app.request_delete();
        app.confirm_delete();
        app.reload();
        assert_eq!(app.tasks.len(), 1);
        assert_eq!(app.state.selected(), Some(0));
    }

    #[test]
    fn failed_delete_reports_in_status_line() {
        let mut app = app_with(vec![task(1, "a", TaskStatus::Pending)]);
        *app.service.api().fail_with.borrow_mut() = Some(500);
        app.request_delete();
        app.confirm_delete();
        assert_eq!(app.flash.as_deref(), Some("Error: could not delete task: boom 500"));
        assert!(!app.needs_reload());
    }

    #[test]
    fn unauthorized_ends_the_session() {
        let mut app = app_with(vec![task(1, "a", TaskStatus::Pending)]);
        *app.service.api().fail_with.borrow_mut() = Some(401);
        app.bump_refresh();
        app.reload();
        assert!(app.session_lost);
        assert!(app.should_quit);
    }

    #[test]
    fn quick_add_parses_metadata() {
        let mut app = app_with(vec![]);
        app.enter_add_mode();
        for c in "Call mom st:doing".chars() {
            app.input_char(c);
        }
        app.submit_quick_add();
        app.reload();
        assert_eq!(app.tasks[0].title, "Call mom");
        assert_eq!(app.tasks[0].status, TaskStatus::InProgress);
        assert!(matches!(app.mode, Mode::Normal));
    }

    #[test]
    fn filters_cycle_back_to_all() {
        let mut app = app_with(vec![
            task(1, "a", TaskStatus::Pending),
            task(2, "b", TaskStatus::Completed),
        ]);
        app.cycle_status_filter();
        app.reload();
        assert_eq!(app.filter.status, Some(TaskStatus::Pending));
        assert_eq!(app.tasks.len(), 1);

        for _ in 0..4 {
            app.cycle_status_filter();
        }
        assert_eq!(app.filter.status, None);
        app.reload();
        assert_eq!(app.tasks.len(), 2);
    }

    #[test]
    fn navigation_wraps() {
        let mut app = app_with(two_pending());
        app.previous();
        assert_eq!(app.state.selected(), Some(1));
        app.next();
        assert_eq!(app.state.selected(), Some(0));
    }
}
