//! # Page Framework
//!
//! Shared lifecycle for every page: a button carousel, a keybinding table and
//! the title / button row / keybindings legend every page draws.
//!
//! ## Keybindings
//!
//! A page binds logical [`Key`]s to its own command type `C`. `Escape` is
//! reserved: it is always bound to "exit this page" unless the page passes
//! `allow_override_reserved` to [`Page::enter`]. Dispatch does not call the
//! page back; [`Page::dispatch_input`] returns the bound command and the page
//! handles it, which keeps the session state owned by the page instance.
//!
//! ## Refresh
//!
//! Every page refresh starts with [`Page::begin_refresh`], which clears the
//! screen and stamps the refresh time, so the title always shows when data was
//! last fetched, not when it was last drawn.

use crate::ui::error::UiError;
use crate::ui::keys::Key;
use crate::ui::screen::{text_width, Screen};
use chrono::{DateTime, Local};
use crossterm::event::KeyCode;
use ratatui::backend::Backend;
use std::collections::HashMap;

pub const APP_TITLE: &str = "Supervisor";

pub const KEYBINDINGS_HELP: [&str; 6] = [
    "Esc: Exit Page",
    "Tab: Switch Section",
    "Enter: Execute",
    "PgUp/PgDn: Scroll Table",
    "Left/Right Arrow: Change Button",
    "Up/Down Arrow: Change Process",
];

pub const KEYBINDINGS_HELP_SEPARATOR: &str = " | ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    /// Horizontal movement: `+1` for right, `-1` for left, `0` otherwise.
    pub fn step(self) -> isize {
        match self {
            Direction::Right => 1,
            Direction::Left => -1,
            Direction::Up | Direction::Down => 0,
        }
    }
}

/// Move `index` by `step` within `0..len`, wrapping at both ends.
pub fn cycle_index(index: usize, len: usize, step: isize) -> usize {
    if len == 0 {
        return 0;
    }
    let len = len as isize;
    (index as isize + step).rem_euclid(len) as usize
}

/// Clip `text` to `width` characters, replacing the tail with `...`.
pub fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() > width {
        let kept: String = text.chars().take(width.saturating_sub(3)).collect();
        return format!("{kept}...");
    }

    text.to_string()
}

pub fn format_time(time: &DateTime<Local>) -> String {
    time.format("%A %d %B %Y %H:%M:%S").to_string()
}

/// Greedily pack help items into lines no wider than `width`, joined by
/// `" | "`. Every line is right-padded to the widest one.
pub fn pack_keybindings_help(items: &[&str], width: usize) -> Vec<String> {
    let separator_len = KEYBINDINGS_HELP_SEPARATOR.len();
    let mut lines = Vec::new();
    let mut line = String::new();

    for (i, item) in items.iter().enumerate() {
        let is_last = i + 1 == items.len();
        let entry = if is_last {
            (*item).to_string()
        } else {
            format!("{item}{KEYBINDINGS_HELP_SEPARATOR}")
        };

        if !line.is_empty() && line.len() + entry.len() + separator_len > width {
            line.truncate(line.len() - separator_len);
            lines.push(std::mem::take(&mut line));
        }

        line.push_str(&entry);

        if is_last {
            lines.push(std::mem::take(&mut line));
        }
    }

    let max_len = lines.iter().map(String::len).max().unwrap_or(0);
    lines
        .into_iter()
        .map(|l| format!("{l:<max_len$}"))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Button<T> {
    pub label: &'static str,
    /// `None` makes the button inert.
    pub action: Option<T>,
}

impl<T> Button<T> {
    pub fn new(label: &'static str, action: Option<T>) -> Self {
        Self { label, action }
    }
}

/// An ordered set of buttons with exactly one selected.
#[derive(Debug, Clone)]
pub struct Carousel<T> {
    buttons: Vec<Button<T>>,
    selected: usize,
}

impl<T> Default for Carousel<T> {
    fn default() -> Self {
        Self {
            buttons: Vec::new(),
            selected: 0,
        }
    }
}

impl<T> Carousel<T> {
    pub fn new(buttons: Vec<Button<T>>, selected: usize) -> Result<Self, UiError> {
        if selected >= buttons.len() {
            return Err(UiError::InvalidButton {
                index: selected,
                len: buttons.len(),
            });
        }

        Ok(Self { buttons, selected })
    }

    pub fn cycle(&mut self, direction: Direction) {
        self.selected = cycle_index(self.selected, self.buttons.len(), direction.step());
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected(&self) -> Option<&Button<T>> {
        self.buttons.get(self.selected)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Button<T>> {
        self.buttons.iter()
    }

    pub fn len(&self) -> usize {
        self.buttons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buttons.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding<C> {
    /// Set the page's exit flag.
    Exit,
    Command(C),
}

/// Logical key to binding. Unbound keys are absent.
#[derive(Debug, Clone)]
pub struct Keybindings<C> {
    table: HashMap<Key, Binding<C>>,
}

impl<C> Default for Keybindings<C> {
    fn default() -> Self {
        let mut table = HashMap::new();
        table.insert(Key::Escape, Binding::Exit);
        Self { table }
    }
}

impl<C: Copy> Keybindings<C> {
    pub fn get(&self, key: Key) -> Option<Binding<C>> {
        self.table.get(&key).copied()
    }

    /// Bind (or with `None`, unbind) a raw key code.
    pub fn set(
        &mut self,
        code: KeyCode,
        command: Option<C>,
        override_reserved: bool,
    ) -> Result<(), UiError> {
        let key = Key::from_code(code)
            .ok_or_else(|| UiError::InvalidAction(format!("key {code:?} is not supported")))?;

        if key == Key::Escape && !override_reserved {
            return Err(UiError::ReservedKey(key));
        }

        match command {
            Some(command) => self.table.insert(key, Binding::Command(command)),
            None => self.table.remove(&key),
        };

        Ok(())
    }

    pub fn set_all(
        &mut self,
        bindings: &[(KeyCode, Option<C>)],
        override_reserved: bool,
    ) -> Result<(), UiError> {
        for &(code, command) in bindings {
            self.set(code, command, override_reserved)?;
        }

        Ok(())
    }
}

/// Session state of the page currently owning the event loop.
#[derive(Debug, Clone)]
pub struct Page<C, T> {
    exit: bool,
    last_refresh_time: DateTime<Local>,
    buttons: Carousel<T>,
    keybindings: Keybindings<C>,
}

impl<C: Copy, T: Copy> Default for Page<C, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Copy, T: Copy> Page<C, T> {
    pub fn new() -> Self {
        Self {
            exit: false,
            last_refresh_time: Local::now(),
            buttons: Carousel::default(),
            keybindings: Keybindings::default(),
        }
    }

    /// Reset the session: install the buttons, clear the exit flag and
    /// rebuild the keybinding table from the defaults plus `keybindings`.
    pub fn enter(
        &mut self,
        buttons: Vec<Button<T>>,
        initial_selected_button: usize,
        keybindings: Option<&[(KeyCode, Option<C>)]>,
        allow_override_reserved: bool,
    ) -> Result<(), UiError> {
        let mut table = Keybindings::default();
        if let Some(bindings) = keybindings {
            table.set_all(bindings, allow_override_reserved)?;
        }

        self.buttons = Carousel::new(buttons, initial_selected_button)?;
        self.keybindings = table;
        self.exit = false;

        Ok(())
    }

    pub fn exit_page(&mut self) {
        self.exit = true;
    }

    pub fn should_exit(&self) -> bool {
        self.exit
    }

    pub fn last_refresh_time(&self) -> DateTime<Local> {
        self.last_refresh_time
    }

    pub fn buttons(&self) -> &Carousel<T> {
        &self.buttons
    }

    pub fn keybindings(&self) -> &Keybindings<C> {
        &self.keybindings
    }

    pub fn selected_button(&self) -> Option<&Button<T>> {
        self.buttons.selected()
    }

    pub fn cycle_button(&mut self, direction: Direction) {
        self.buttons.cycle(direction);
    }

    /// Clear the screen and stamp the refresh time. Call first in every
    /// page refresh.
    pub fn begin_refresh<B: Backend>(&mut self, screen: &mut Screen<B>) -> Result<(), UiError> {
        screen.clear()?;
        self.last_refresh_time = Local::now();
        Ok(())
    }

    /// Read one key and resolve it. `Escape` (unless overridden) sets the exit
    /// flag here; other bound keys yield their command for the page to run.
    pub fn dispatch_input<B: Backend>(
        &mut self,
        screen: &mut Screen<B>,
    ) -> Result<Option<C>, UiError> {
        match screen.poll_key()? {
            Some(key) => Ok(self.dispatch_key(key)),
            None => Ok(None),
        }
    }

    pub fn dispatch_key(&mut self, key: Key) -> Option<C> {
        match self.keybindings.get(key)? {
            Binding::Exit => {
                self.exit_page();
                None
            }
            Binding::Command(command) => Some(command),
        }
    }

    pub fn render_title<B: Backend>(&self, screen: &mut Screen<B>, text: &str) -> Result<(), UiError> {
        let title = format!(
            "{APP_TITLE} - {text} ({})",
            format_time(&self.last_refresh_time)
        );
        let col = screen.width().saturating_sub(text_width(&title)) / 2;
        let row = screen.allocate_next_row();
        screen.draw_text(row, col, &title, false)
    }

    /// Buttons left to right, two spaces apart. `suppress_highlight` is set
    /// when focus is in another section.
    pub fn render_buttons<B: Backend>(
        &self,
        screen: &mut Screen<B>,
        suppress_highlight: bool,
    ) -> Result<(), UiError> {
        let row = screen.allocate_next_row();
        let mut col = 0u16;

        for (i, button) in self.buttons.iter().enumerate() {
            let highlighted = i == self.buttons.selected_index() && !suppress_highlight;
            screen.draw_text(row, col, button.label, highlighted)?;
            col = col.saturating_add(text_width(button.label).saturating_add(2));
        }

        Ok(())
    }

    /// The help footer always takes at least two rows: a single packed line
    /// gets a blank row above it.
    pub fn render_keybindings_help<B: Backend>(&self, screen: &mut Screen<B>) -> Result<(), UiError> {
        let lines = pack_keybindings_help(&KEYBINDINGS_HELP, usize::from(screen.width()));

        if lines.len() == 1 {
            let row = screen.allocate_next_row();
            screen.clear_blank_line(row)?;
        }

        for line in &lines {
            let row = screen.allocate_next_row();
            screen.draw_text(row, 0, line, true)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Cmd {
        Go,
        Back,
    }

    fn buttons() -> Vec<Button<u8>> {
        vec![
            Button::new("One", Some(1)),
            Button::new("Two", Some(2)),
            Button::new("Three", None),
        ]
    }

    #[test]
    fn test_truncate_long_text_ends_with_ellipsis() {
        let text = "a description that is much too long";
        let truncated = truncate(text, 18);
        assert_eq!(truncated.chars().count(), 18);
        assert_eq!(truncated, "a description t...");
    }

    #[test]
    fn test_truncate_short_text_unchanged() {
        assert_eq!(truncate("RUNNING", 18), "RUNNING");
        assert_eq!(truncate("exactly10!", 10), "exactly10!");
    }

    #[test]
    fn test_cycle_index_wraps_both_ways() {
        assert_eq!(cycle_index(2, 3, 1), 0);
        assert_eq!(cycle_index(0, 3, -1), 2);
        assert_eq!(cycle_index(1, 3, 0), 1);
        assert_eq!(cycle_index(0, 0, 1), 0);
    }

    #[test]
    fn test_carousel_rejects_out_of_range_selection() {
        let err = Carousel::new(buttons(), 3).unwrap_err();
        assert!(matches!(err, UiError::InvalidButton { index: 3, len: 3 }));
    }

    #[test]
    fn test_carousel_cycle_stays_in_bounds() {
        let mut carousel = Carousel::new(buttons(), 0).unwrap();
        let moves = [
            Direction::Left,
            Direction::Left,
            Direction::Right,
            Direction::Left,
            Direction::Left,
            Direction::Left,
            Direction::Right,
            Direction::Right,
        ];
        let mut expected = 0usize;
        for direction in moves {
            carousel.cycle(direction);
            expected = (expected + 3).wrapping_add_signed(direction.step()) % 3;
            assert_eq!(carousel.selected_index(), expected);
            assert!(carousel.selected().is_some());
        }
    }

    #[test]
    fn test_escape_is_bound_to_exit_by_default() {
        let mut page: Page<Cmd, u8> = Page::new();
        page.enter(buttons(), 0, None, false).unwrap();

        assert_eq!(page.keybindings().get(Key::Escape), Some(Binding::Exit));
        assert_eq!(page.keybindings().get(Key::Enter), None);
        assert_eq!(page.dispatch_key(Key::Escape), None);
        assert!(page.should_exit());
    }

    #[test]
    fn test_rebinding_escape_requires_override() {
        let mut page: Page<Cmd, u8> = Page::new();
        let bindings = [(KeyCode::Esc, Some(Cmd::Back))];

        let err = page.enter(buttons(), 0, Some(&bindings), false).unwrap_err();
        assert!(matches!(err, UiError::ReservedKey(Key::Escape)));

        page.enter(buttons(), 0, Some(&bindings), true).unwrap();
        assert_eq!(page.dispatch_key(Key::Escape), Some(Cmd::Back));
        assert!(!page.should_exit());
    }

    #[test]
    fn test_unrecognized_key_code_is_invalid_action() {
        let mut page: Page<Cmd, u8> = Page::new();
        let bindings = [(KeyCode::Char('x'), Some(Cmd::Go))];

        let err = page.enter(buttons(), 0, Some(&bindings), false).unwrap_err();
        assert!(matches!(err, UiError::InvalidAction(_)));
    }

    #[test]
    fn test_enter_resets_session_state() {
        let mut page: Page<Cmd, u8> = Page::new();
        let bindings = [(KeyCode::Enter, Some(Cmd::Go))];
        page.enter(buttons(), 1, Some(&bindings), false).unwrap();
        page.cycle_button(Direction::Right);
        page.exit_page();

        page.enter(buttons(), 0, None, false).unwrap();
        assert!(!page.should_exit());
        assert_eq!(page.buttons().selected_index(), 0);
        assert_eq!(page.dispatch_key(Key::Enter), None);
    }

    #[test]
    fn test_unbound_keys_are_ignored() {
        let mut page: Page<Cmd, u8> = Page::new();
        let bindings = [(KeyCode::Enter, Some(Cmd::Go)), (KeyCode::Tab, None)];
        page.enter(buttons(), 0, Some(&bindings), false).unwrap();

        assert_eq!(page.dispatch_key(Key::Enter), Some(Cmd::Go));
        assert_eq!(page.dispatch_key(Key::Tab), None);
        assert_eq!(page.dispatch_key(Key::PageDown), None);
        assert!(!page.should_exit());
    }

    #[test]
    fn test_pack_keybindings_help_at_minimum_width() {
        let lines = pack_keybindings_help(&KEYBINDINGS_HELP, 110);

        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            "Esc: Exit Page | Tab: Switch Section | Enter: Execute | PgUp/PgDn: Scroll Table"
        );
        assert_eq!(
            lines[1].trim_end(),
            "Left/Right Arrow: Change Button | Up/Down Arrow: Change Process"
        );
        assert_eq!(lines[0].len(), 79);
        assert_eq!(lines[1].len(), 79);
    }

    #[test]
    fn test_pack_keybindings_help_narrow_width() {
        let lines = pack_keybindings_help(&KEYBINDINGS_HELP, 40);

        assert_eq!(lines.len(), 6);
        for line in &lines {
            assert_eq!(line.len(), 31);
            assert!(!line.trim_end().ends_with('|'));
        }
        assert_eq!(lines[0].trim_end(), "Esc: Exit Page");
        assert_eq!(lines[4].trim_end(), "Left/Right Arrow: Change Button");
    }

    #[test]
    fn test_pack_keybindings_help_wide_width_is_single_line() {
        let lines = pack_keybindings_help(&KEYBINDINGS_HELP, 200);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0], KEYBINDINGS_HELP.join(KEYBINDINGS_HELP_SEPARATOR));
    }
}
