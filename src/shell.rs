//! Line-oriented console front end over `CoreState`.
//!
//! One editor is active at a time. Field values are typed with
//! `set <label> = <value>`; labels may contain spaces. Errors are printed
//! as `[Kind] message` and never end the session.
//!
//! `update` sends only the non-key fields typed with `set`/`unset` since
//! the editor was opened or cleared. Kind defaults shown by `show` stay
//! local until the user sets them.

use std::io::{self, BufRead, Write};

use crate::core_state::CoreState;
use crate::editor::{DeleteConfirmation, DeleteOutcome, DeletePrompt, EntityEditor, MutationOutcome, QueryOutcome};
use crate::error::EditorError;
use crate::models::RowSet;

const HELP: &str = "\
Commands:
  entities                  list entities and row counts
  open <entity>             switch to an entity editor and load its rows
  fields                    print the active entity's fields as JSON
  show                      print the current inputs
  set <label> = <value>     fill an input (blank value empties it)
  unset <label>             empty an input
  load                      reload and print every row
  query <label> = <value>   substring filter on one field
  add | update | delete     mutate using the current inputs
                            (update writes only fields you `set`)
  clear                     reset inputs to their defaults
  help                      this text
  quit                      leave";

pub struct Shell<'s, R, W> {
    state: &'s CoreState,
    input: R,
    output: W,
    editor: Option<EntityEditor>,
    /// Columns set or unset by the user since the last open, clear or
    /// committed mutation.
    touched: Vec<&'static str>,
}

impl<'s, R: BufRead, W: Write> Shell<'s, R, W> {
    pub fn new(state: &'s CoreState, input: R, output: W) -> Self {
        Self {
            state,
            input,
            output,
            editor: None,
            touched: Vec::new(),
        }
    }

    /// Read commands until `quit` or end of input.
    pub fn run(&mut self) -> io::Result<()> {
        writeln!(self.output, "{} {} (type `help`)", crate::config::APP_NAME, crate::config::APP_VERSION)?;
        loop {
            self.prompt()?;
            let Some(line) = self.read_line()? else {
                break;
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if matches!(line, "quit" | "exit") {
                break;
            }
            self.dispatch(line)?;
        }
        self.output.flush()
    }

    pub fn into_output(self) -> W {
        self.output
    }

    fn prompt(&mut self) -> io::Result<()> {
        match &self.editor {
            Some(editor) => write!(self.output, "{}> ", editor.entity())?,
            None => write!(self.output, "> ")?,
        }
        self.output.flush()
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        read_line(&mut self.input)
    }

    fn dispatch(&mut self, line: &str) -> io::Result<()> {
        let (command, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();
        let result = match command {
            "help" => writeln!(self.output, "{HELP}").map(|_| Ok(())),
            "entities" => self.entities(),
            "open" => self.open(rest),
            _ if self.editor.is_some() => self.editor_command(command, rest),
            _ => writeln!(self.output, "No entity open; use `open <entity>`.").map(|_| Ok(())),
        }?;
        if let Err(err) = result {
            writeln!(self.output, "[{}] {err}", err.kind())?;
        }
        Ok(())
    }

    fn entities(&mut self) -> io::Result<Result<(), EditorError>> {
        let summaries = match self.state.entities() {
            Ok(s) => s,
            Err(err) => {
                writeln!(self.output, "[StorageError] {err}")?;
                return Ok(Ok(()));
            }
        };
        for s in summaries {
            writeln!(
                self.output,
                "{:<12} {:<13} {} fields, {} rows",
                s.entity.as_str(),
                s.table,
                s.field_count,
                s.row_count
            )?;
        }
        Ok(Ok(()))
    }

    fn open(&mut self, name: &str) -> io::Result<Result<(), EditorError>> {
        let mut editor = match self.state.open_editor(name) {
            Ok(editor) => editor,
            Err(err) => return Ok(Err(err)),
        };
        let loaded = editor.load_all().map(|_| ());
        print_rows(&mut self.output, editor.rows())?;
        self.editor = Some(editor);
        self.touched.clear();
        Ok(loaded)
    }

    fn editor_command(&mut self, command: &str, rest: &str) -> io::Result<Result<(), EditorError>> {
        let Some(editor) = self.editor.as_mut() else {
            return Ok(Ok(()));
        };
        let out = &mut self.output;
        let touched = &mut self.touched;
        match command {
            "fields" => {
                let json = serde_json::to_string_pretty(editor.schema().fields)
                    .map_err(io::Error::other)?;
                writeln!(out, "{json}")?;
            }
            "show" => {
                let schema = editor.schema();
                for (field, value) in editor.inputs().iter() {
                    let text = value.map(|v| v.to_string()).unwrap_or_default();
                    let marker = if value.is_some()
                        && !schema.is_key(field.column)
                        && !touched.contains(&field.column)
                    {
                        " (default)"
                    } else {
                        ""
                    };
                    writeln!(out, "{:<24} {text}{marker}", field.label)?;
                }
            }
            "set" => {
                let (label, value) = split_assignment(rest);
                if let Err(err) = editor.inputs_mut().set(label, value) {
                    return Ok(Err(err));
                }
                mark_touched(touched, editor, label);
            }
            "unset" => {
                if let Err(err) = editor.inputs_mut().clear(rest) {
                    return Ok(Err(err));
                }
                mark_touched(touched, editor, rest);
            }
            "clear" => {
                editor.clear_inputs();
                touched.clear();
            }
            "load" => {
                let loaded = editor.load_all().map(|_| ());
                print_rows(out, editor.rows())?;
                return Ok(loaded);
            }
            "query" => {
                let (label, value) = split_assignment(rest);
                editor.set_filter_value(value);
                match editor.query(label, value) {
                    Ok(QueryOutcome::Rows(_)) => print_rows(out, editor.rows())?,
                    Ok(QueryOutcome::NoMatch { label, value }) => {
                        writeln!(out, "No {} rows where {label} contains \"{value}\".", editor.entity())?;
                    }
                    Err(err) => return Ok(Err(err)),
                }
            }
            "add" | "update" => {
                let mut pending = editor.inputs().clone();
                let outcome = match command {
                    "add" => editor.add(&pending),
                    _ => {
                        for field in editor.schema().non_key_fields() {
                            if !touched.contains(&field.column) {
                                if let Err(err) = pending.clear(field.column) {
                                    return Ok(Err(err));
                                }
                            }
                        }
                        editor.update(&pending)
                    }
                };
                match outcome {
                    Ok(outcome) => {
                        touched.clear();
                        report_mutation(out, command, &outcome, editor.rows())?
                    }
                    Err(err) => return Ok(Err(err)),
                }
            }
            "delete" => {
                let pending = editor.inputs().clone();
                let mut confirm = ConsoleConfirmation {
                    input: &mut self.input,
                    output: &mut *out,
                    failed: None,
                };
                let outcome = editor.delete(&pending, &mut confirm);
                if let Some(err) = confirm.failed.take() {
                    return Err(err);
                }
                match outcome {
                    Ok(DeleteOutcome::Deleted(outcome)) => {
                        touched.clear();
                        report_mutation(out, command, &outcome, editor.rows())?
                    }
                    Ok(DeleteOutcome::Cancelled) => writeln!(out, "Delete cancelled.")?,
                    Err(err) => return Ok(Err(err)),
                }
            }
            other => writeln!(out, "Unknown command `{other}`; type `help`.")?,
        }
        Ok(Ok(()))
    }
}

/// Asks on the console; anything but `y`/`yes` declines.
struct ConsoleConfirmation<'a, R, W> {
    input: &'a mut R,
    output: &'a mut W,
    failed: Option<io::Error>,
}

impl<R: BufRead, W: Write> DeleteConfirmation for ConsoleConfirmation<'_, R, W> {
    fn confirm(&mut self, prompt: &DeletePrompt) -> bool {
        let answer = write!(self.output, "{prompt} [y/N] ")
            .and_then(|_| self.output.flush())
            .and_then(|_| read_line(self.input));
        match answer {
            Ok(Some(line)) => matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            Ok(None) => false,
            Err(err) => {
                self.failed = Some(err);
                false
            }
        }
    }
}

fn mark_touched(touched: &mut Vec<&'static str>, editor: &EntityEditor, name: &str) {
    let schema = editor.schema();
    if let Some(idx) = schema.position(name) {
        let column = schema.fields[idx].column;
        if !touched.contains(&column) {
            touched.push(column);
        }
    }
}

fn read_line<R: BufRead>(input: &mut R) -> io::Result<Option<String>> {
    let mut line = String::new();
    match input.read_line(&mut line)? {
        0 => Ok(None),
        _ => Ok(Some(line)),
    }
}

/// `Label = value` → (`Label`, `value`); without `=` the value is blank.
fn split_assignment(rest: &str) -> (&str, &str) {
    match rest.split_once('=') {
        Some((label, value)) => (label.trim(), value.trim()),
        None => (rest.trim(), ""),
    }
}

fn report_mutation<W: Write>(
    out: &mut W,
    command: &str,
    outcome: &MutationOutcome,
    rows: &RowSet,
) -> io::Result<()> {
    writeln!(out, "{command}: affected rows: {}", outcome.affected)?;
    match &outcome.reload_error {
        Some(err) => writeln!(out, "[{}] reload failed: {err}", err.kind()),
        None => print_rows(out, rows),
    }
}

fn print_rows<W: Write>(out: &mut W, rows: &RowSet) -> io::Result<()> {
    writeln!(out, "{}", rows.columns.join(" | "))?;
    for row in &rows.rows {
        writeln!(out, "{}", row.join(" | "))?;
    }
    writeln!(out, "({} rows)", rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn session(state: &CoreState, script: &str) -> String {
        let mut shell = Shell::new(state, Cursor::new(script.to_string()), Vec::new());
        shell.run().unwrap();
        String::from_utf8(shell.into_output()).unwrap()
    }

    #[test]
    fn add_department_and_list_it() {
        let state = CoreState::in_memory().unwrap();
        let out = session(
            &state,
            "open Department\n\
             set Department ID = D1\n\
             set Department Name = Cardiology\n\
             set Department Address = Bldg A\n\
             set Department Phone = 555-0100\n\
             add\n\
             quit\n",
        );
        assert!(out.contains("add: affected rows: 1"));
        assert!(out.contains("D1 | Cardiology | Bldg A | 555-0100"));
    }

    #[test]
    fn errors_are_printed_with_kind() {
        let state = CoreState::in_memory().unwrap();
        let out = session(&state, "open Doctor\nupdate\nset Age = old\nopen Ward\n");
        assert!(out.contains("[MissingKey]"));
        assert!(out.contains("[InvalidInput]"));
        assert!(out.contains("[NotConfigured]"));
    }

    #[test]
    fn delete_asks_before_removing() {
        let state = CoreState::in_memory().unwrap();
        let out = session(
            &state,
            "open Drug\nset Drug ID = G1\nadd\n\
             set Drug ID = G1\ndelete\nn\n\
             delete\ny\n",
        );
        assert!(out.contains("Delete Drug record [drug_id=G1]? [y/N]"));
        assert!(out.contains("Delete cancelled."));
        assert!(out.contains("delete: affected rows: 1"));
        let drug = state.entities().unwrap()[3].clone();
        assert_eq!(drug.row_count, 0);
    }

    #[test]
    fn update_sends_only_fields_the_user_set() {
        let state = CoreState::in_memory().unwrap();
        state
            .connection()
            .lock()
            .unwrap()
            .execute_batch(
                "INSERT INTO department (dept_id, name) VALUES ('D1', 'Cardiology');
                 INSERT INTO doctor (doctor_id, name, title, sex, age, dept_id)
                 VALUES ('DR1', 'Ada Wu', 'Chief', 0, 51, 'D1');",
            )
            .unwrap();
        let out = session(
            &state,
            "open Doctor
set Doctor ID = DR1
set Title = Attending
show
update
",
        );
        assert!(out.contains("male (default)"));
        assert!(out.contains("update: affected rows: 1"));
        assert!(out.contains("DR1 | Ada Wu | Attending | female | 51 | D1 | Cardiology"));
    }

    #[test]
    fn query_without_match_is_reported() {
        let state = CoreState::in_memory().unwrap();
        let out = session(&state, "open Room\nquery Room Address = Ward 9\n");
        assert!(out.contains("No Room rows where Room Address contains \"Ward 9\"."));
    }

    #[test]
    fn commands_need_an_open_entity() {
        let state = CoreState::in_memory().unwrap();
        let out = session(&state, "add\nentities\n");
        assert!(out.contains("No entity open"));
        assert!(out.contains("PatientDrug"));
    }

    #[test]
    fn fields_printed_as_json() {
        let state = CoreState::in_memory().unwrap();
        let out = session(&state, "open Room\nfields\n");
        assert!(out.contains("\"column\": \"room_id\""));
        assert!(out.contains("\"label\": \"Room Address\""));
    }
}
