use taskdesk_core::{Field, Task, TaskForm, ValidationErrors};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FormKind {
    Create,
    Edit { id: i64 },
}

/// Editing state of the create/edit modal.
#[derive(Debug, Clone)]
pub struct FormState {
    pub kind: FormKind,
    pub form: TaskForm,
    pub focus: Field,
    pub cursor: usize,
    pub errors: ValidationErrors,
    pub server_error: Option<String>,
}

impl FormState {
    pub fn create() -> Self {
        Self::with(FormKind::Create, TaskForm::default())
    }

    pub fn edit(task: &Task) -> Self {
        Self::with(FormKind::Edit { id: task.id }, TaskForm::from_task(task))
    }

    fn with(kind: FormKind, form: TaskForm) -> Self {
        let cursor = form.title.chars().count();
        FormState {
            kind,
            form,
            focus: Field::Title,
            cursor,
            errors: ValidationErrors::default(),
            server_error: None,
        }
    }

    pub fn title(&self) -> &'static str {
        match self.kind {
            FormKind::Create => " New Task ",
            FormKind::Edit { .. } => " Edit Task ",
        }
    }

    pub fn text(&self, field: Field) -> Option<&str> {
        match field {
            Field::Title => Some(&self.form.title),
            Field::Description => Some(&self.form.description),
            Field::DueDate => Some(&self.form.due_date),
            Field::Priority | Field::Status => None,
        }
    }

    fn text_mut(&mut self) -> Option<&mut String> {
        match self.focus {
            Field::Title => Some(&mut self.form.title),
            Field::Description => Some(&mut self.form.description),
            Field::DueDate => Some(&mut self.form.due_date),
            Field::Priority | Field::Status => None,
        }
    }

    fn set_focus(&mut self, field: Field) {
        self.focus = field;
        self.cursor = self.text(field).map(|t| t.chars().count()).unwrap_or(0);
    }

    pub fn focus_next(&mut self) {
        let pos = Field::ALL.iter().position(|f| *f == self.focus).unwrap_or(0);
        self.set_focus(Field::ALL[(pos + 1) % Field::ALL.len()]);
    }

    pub fn focus_previous(&mut self) {
        let pos = Field::ALL.iter().position(|f| *f == self.focus).unwrap_or(0);
        self.set_focus(Field::ALL[(pos + Field::ALL.len() - 1) % Field::ALL.len()]);
    }

    pub fn input_char(&mut self, c: char) {
        let cursor = self.cursor;
        if let Some(text) = self.text_mut() {
            let byte_index = text.chars().take(cursor).map(|c| c.len_utf8()).sum();
            text.insert(byte_index, c);
            self.cursor += 1;
        }
    }

    pub fn delete_char(&mut self) {
        let cursor = self.cursor;
        if cursor == 0 {
            return;
        }
        if let Some(text) = self.text_mut() {
            let byte_index: usize = text.chars().take(cursor - 1).map(|c| c.len_utf8()).sum();
            text.remove(byte_index);
            self.cursor -= 1;
        }
    }

    /// Moves the cursor in text fields, cycles the value in choice fields.
    pub fn left(&mut self) {
        match self.focus {
            Field::Priority => self.form.priority = self.form.priority.previous(),
            Field::Status => self.form.status = self.form.status.previous(),
            _ => self.cursor = self.cursor.saturating_sub(1),
        }
    }

    pub fn right(&mut self) {
        match self.focus {
            Field::Priority => self.form.priority = self.form.priority.next(),
            Field::Status => self.form.status = self.form.status.next(),
            _ => {
                let len = self.text(self.focus).map(|t| t.chars().count()).unwrap_or(0);
                if self.cursor < len {
                    self.cursor += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskdesk_core::{Priority, TaskStatus};

    #[test]
    fn typing_edits_the_focused_text_field() {
        let mut state = FormState::create();
        for c in "Tsk".chars() {
            state.input_char(c);
        }
        state.left();
        state.left();
        state.input_char('a');
        assert_eq!(state.form.title, "Task");
        state.delete_char();
        assert_eq!(state.form.title, "Tsk");
    }

    #[test]
    fn focus_wraps_and_resets_cursor() {
        let mut state = FormState::create();
        state.focus_previous();
        assert_eq!(state.focus, Field::DueDate);
        state.focus_next();
        assert_eq!(state.focus, Field::Title);
        assert_eq!(state.cursor, 0);
    }

    #[test]
    fn arrows_cycle_choice_fields() {
        let mut state = FormState::create();
        state.focus_next();
        state.focus_next();
        assert_eq!(state.focus, Field::Priority);
        state.right();
        assert_eq!(state.form.priority, Priority::High);
        state.input_char('x');
        assert_eq!(state.form.title, "");

        state.focus_next();
        state.left();
        assert_eq!(state.form.status, TaskStatus::Cancelled);
    }

    #[test]
    fn multibyte_input_is_char_indexed() {
        let mut state = FormState::create();
        state.input_char('é');
        state.input_char('ß');
        state.left();
        state.delete_char();
        assert_eq!(state.form.title, "ß");
        state.right();
        state.right();
        assert_eq!(state.cursor, 1);
    }
}
