use std::collections::BTreeSet;

use anyhow::Result;
use chanview_core::LinkId;
use chanview_core::Theme;
use chanview_core::ThreadView;
use chanview_core::input::InputEvent;
use chanview_core::input::KeyCode;
use chanview_core::input::KeyEvent;
use chanview_core::keymap;
use chanview_core::keymap::Binding;
use chanview_core::view::ThreadViewOptions;
use chanview_core::view::ViewAction;
use ratatui::Frame;
use ratatui::layout::Constraint;
use ratatui::layout::Direction;
use ratatui::layout::Layout;
use ratatui::layout::Rect;
use ratatui::text::Line;
use ratatui::text::Span;
use ratatui::widgets::Block;
use ratatui::widgets::Borders;
use ratatui::widgets::List;
use ratatui::widgets::ListItem;
use ratatui::widgets::ListState;

use crate::store::ImageBoard;
use crate::store::PostNum;
use crate::target::LinkTarget;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Focus {
    Boards,
    Threads,
    Thread,
}

impl Focus {
    const ORDER: [Focus; 3] = [Focus::Boards, Focus::Threads, Focus::Thread];

    fn index(self) -> usize {
        Self::ORDER.iter().position(|f| *f == self).unwrap_or(0)
    }

    /// Neighbouring pane; stays put at either edge.
    pub fn step(self, delta: isize) -> Self {
        let idx = (self.index() as isize + delta).clamp(0, Self::ORDER.len() as isize - 1);
        Self::ORDER[idx as usize]
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TreeRow {
    Category { name: String, expanded: bool },
    Board { id: String, name: String },
}

struct AppBindings {
    quit: Binding,
    focus: Binding,
    up: Binding,
    down: Binding,
    open: Binding,
    links: Binding,
}

impl Default for AppBindings {
    fn default() -> Self {
        Self {
            quit: Binding::new(
                "q",
                "quit",
                vec![KeyEvent::char('q'), KeyEvent::new(KeyCode::Esc)],
            ),
            focus: Binding::new(
                "←/→",
                "pane",
                vec![KeyEvent::new(KeyCode::Left), KeyEvent::new(KeyCode::Right)],
            ),
            up: Binding::new(
                "↑/k",
                "up",
                vec![KeyEvent::new(KeyCode::Up), KeyEvent::char('k')],
            ),
            down: Binding::new(
                "↓/j",
                "down",
                vec![KeyEvent::new(KeyCode::Down), KeyEvent::char('j')],
            ),
            open: Binding::new("enter", "open", vec![KeyEvent::new(KeyCode::Enter)]),
            links: Binding::new("tab/n/N", "links", vec![]),
        }
    }
}

/// Three-pane reader: board tree, thread subjects of the open board, and the thread itself.
pub struct App {
    store: ImageBoard,
    theme: Theme,
    bindings: AppBindings,
    focus: Focus,
    expanded: BTreeSet<String>,
    boards_state: ListState,
    board: Option<String>,
    threads: Vec<(PostNum, String)>,
    threads_state: ListState,
    view: ThreadView,
    status: Option<String>,
    quit: bool,
}

impl App {
    pub fn new(store: ImageBoard, view_options: ThreadViewOptions) -> Self {
        Self {
            store,
            theme: Theme::default(),
            bindings: AppBindings::default(),
            focus: Focus::Boards,
            expanded: BTreeSet::new(),
            boards_state: ListState::default(),
            board: None,
            threads: Vec::new(),
            threads_state: ListState::default(),
            view: ThreadView::with_options(view_options),
            status: None,
            quit: false,
        }
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn board(&self) -> Option<&str> {
        self.board.as_deref()
    }

    pub fn threads(&self) -> &[(PostNum, String)] {
        &self.threads
    }

    pub fn view(&self) -> &ThreadView {
        &self.view
    }

    pub fn load_catalog(&mut self) -> Result<()> {
        self.store.load_catalog()?;
        self.expanded.clear();
        self.boards_state
            .select((!self.tree_rows().is_empty()).then_some(0));
        Ok(())
    }

    /// Rows of the board tree as currently expanded.
    pub fn tree_rows(&self) -> Vec<TreeRow> {
        let mut rows = Vec::new();
        for (category, ids) in self.store.categories() {
            let expanded = self.expanded.contains(category);
            rows.push(TreeRow::Category {
                name: category.to_string(),
                expanded,
            });
            if !expanded {
                continue;
            }
            for id in ids {
                let name = self
                    .store
                    .board(id)
                    .map(|b| b.name.clone())
                    .unwrap_or_default();
                rows.push(TreeRow::Board {
                    id: id.clone(),
                    name,
                });
            }
        }
        rows
    }

    /// Expands the category holding `board`, selects it in the tree and opens it.
    pub fn select_board(&mut self, board: &str) -> Result<()> {
        let category = self
            .store
            .categories()
            .find(|(_, ids)| ids.iter().any(|id| id == board))
            .map(|(cat, _)| cat.to_string());
        if let Some(category) = category {
            self.expanded.insert(category);
            let row = self
                .tree_rows()
                .iter()
                .position(|r| matches!(r, TreeRow::Board { id, .. } if id == board));
            self.boards_state.select(row);
        }
        self.open_board(board)
    }

    pub fn open_board(&mut self, board: &str) -> Result<()> {
        self.store.update_board(board)?;
        self.threads = self.store.thread_subjects(board)?;
        self.board = Some(board.to_string());
        self.threads_state
            .select((!self.threads.is_empty()).then_some(0));
        self.set_focus(Focus::Threads);
        self.preview_selected();
        Ok(())
    }

    /// Shows the selected thread from what the board index already holds.
    fn preview_selected(&mut self) {
        let Some((board, num)) = self.selected_thread() else {
            self.view.clear();
            return;
        };
        match self.store.render_thread(&board, num) {
            Ok(markup) => self.show_markup(markup),
            Err(err) => self.report(err.into()),
        }
    }

    pub fn open_selected_thread(&mut self) -> Result<()> {
        let Some((board, num)) = self.selected_thread() else {
            return Ok(());
        };
        let num = self.store.update_thread(&board, num)?;
        let markup = self.store.render_thread(&board, num)?;
        self.show_markup(markup);
        self.set_focus(Focus::Thread);
        Ok(())
    }

    fn selected_thread(&self) -> Option<(String, PostNum)> {
        let board = self.board.clone()?;
        let (num, _) = self.threads.get(self.threads_state.selected()?)?;
        Some((board, *num))
    }

    fn show_markup(&mut self, markup: String) {
        if let Err(err) = self.view.set_markup(markup) {
            self.report(err.into());
        }
    }

    fn follow_link(&mut self, id: LinkId) -> Result<()> {
        let Some(link) = self.view.link(id).cloned() else {
            return Ok(());
        };
        match LinkTarget::classify(&link, self.store.endpoints().base()) {
            Some(LinkTarget::Post {
                board,
                thread,
                post,
            }) => {
                tracing::debug!(board = %board, %thread, %post, "following reply link");
                let thread = self.store.update_thread(&board, thread)?;
                let markup = self.store.render_thread(&board, thread)?;
                self.show_markup(markup);
                self.reveal_post(post);
                self.status = Some(format!("/{board}/ thread {thread}, post {post}"));
            }
            Some(LinkTarget::External(url)) => {
                self.status = Some(format!("external link: {url}"));
            }
            None => {
                self.status = Some(format!("cannot follow {:?}", link.target));
            }
        }
        Ok(())
    }

    fn reveal_post(&mut self, post: PostNum) {
        let header = format!(" #{post}");
        let line = self.view.document().and_then(|doc| {
            doc.lines().iter().position(|l| {
                l.blocks().first().is_some_and(|b| b.style.bold) && l.plain().ends_with(&header)
            })
        });
        if let Some(line) = line {
            self.view.state.to_start();
            self.view.state.scroll_by(line as i64);
        }
    }

    fn set_focus(&mut self, focus: Focus) {
        if self.focus != focus {
            tracing::debug!(from = ?self.focus, to = ?focus, "focus");
        }
        self.focus = focus;
    }

    fn report(&mut self, err: anyhow::Error) {
        tracing::warn!(error = %format!("{err:#}"), "action failed");
        self.status = Some(format!("error: {err:#}"));
    }

    /// Dispatches one input event. Failures end up in the status line.
    pub fn handle_event(&mut self, event: InputEvent) {
        if let Err(err) = self.dispatch(event) {
            self.report(err);
        }
    }

    fn dispatch(&mut self, event: InputEvent) -> Result<()> {
        let key = match event {
            InputEvent::Key(key) => key,
            other => {
                if self.focus == Focus::Thread || matches!(other, InputEvent::Resize { .. }) {
                    self.view.handle_event(other);
                }
                return Ok(());
            }
        };
        self.status = None;

        if self.bindings.quit.matches(&key) {
            self.quit = true;
            return Ok(());
        }
        if self.bindings.focus.matches(&key) {
            let delta = if key.code == KeyCode::Left { -1 } else { 1 };
            self.set_focus(self.focus.step(delta));
            return Ok(());
        }

        match self.focus {
            Focus::Boards => self.boards_key(&key),
            Focus::Threads => self.threads_key(&key),
            Focus::Thread => {
                if let ViewAction::LinkActivated(id) =
                    self.view.handle_event_action(InputEvent::Key(key))
                {
                    self.follow_link(id)?;
                }
                Ok(())
            }
        }
    }

    fn boards_key(&mut self, key: &KeyEvent) -> Result<()> {
        let rows = self.tree_rows();
        if self.bindings.up.matches(key) {
            move_selection(&mut self.boards_state, rows.len(), -1);
        } else if self.bindings.down.matches(key) {
            move_selection(&mut self.boards_state, rows.len(), 1);
        } else if self.bindings.open.matches(key) {
            match self.boards_state.selected().and_then(|i| rows.get(i)) {
                Some(TreeRow::Category { name, expanded }) => {
                    if *expanded {
                        self.expanded.remove(name);
                    } else {
                        self.expanded.insert(name.clone());
                    }
                }
                Some(TreeRow::Board { id, .. }) => self.open_board(id)?,
                None => {}
            }
        }
        Ok(())
    }

    fn threads_key(&mut self, key: &KeyEvent) -> Result<()> {
        if self.bindings.up.matches(key) || self.bindings.down.matches(key) {
            let delta = if self.bindings.up.matches(key) { -1 } else { 1 };
            let before = self.threads_state.selected();
            move_selection(&mut self.threads_state, self.threads.len(), delta);
            if self.threads_state.selected() != before {
                self.preview_selected();
            }
        } else if self.bindings.open.matches(key) {
            self.open_selected_thread()?;
        }
        Ok(())
    }

    pub fn draw(&mut self, frame: &mut Frame) {
        let [main, status] = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .areas(frame.area());
        let [boards_area, threads_area, thread_area] = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Fill(2),
                Constraint::Fill(5),
                Constraint::Fill(7),
            ])
            .areas(main);

        let rows = self.tree_rows();
        let items = rows.iter().map(|row| match row {
            TreeRow::Category { name, expanded } => {
                let marker = if *expanded { "▾" } else { "▸" };
                ListItem::new(format!("{marker} {name}"))
            }
            TreeRow::Board { id, name } => ListItem::new(Line::from(vec![
                Span::styled(format!("  /{id}/ "), self.theme.accent),
                Span::styled(name.clone(), self.theme.text_muted),
            ])),
        });
        let list = List::new(items)
            .block(self.pane_block("Boards", Focus::Boards))
            .highlight_style(self.theme.selection);
        frame.render_stateful_widget(list, boards_area, &mut self.boards_state);

        let title = match &self.board {
            Some(board) => format!("/{board}/"),
            None => "Threads".to_string(),
        };
        let items = self
            .threads
            .iter()
            .map(|(_, subject)| ListItem::new(subject.clone()));
        let list = List::new(items)
            .block(self.pane_block(&title, Focus::Threads))
            .highlight_style(self.theme.selection);
        frame.render_stateful_widget(list, threads_area, &mut self.threads_state);

        let block = self.pane_block("Thread", Focus::Thread);
        let inner = block.inner(thread_area);
        frame.render_widget(block, thread_area);
        self.view.render_ref(inner, frame.buffer_mut(), &self.theme);

        self.draw_status(frame, status);
    }

    fn pane_block(&self, title: &str, pane: Focus) -> Block<'static> {
        let style = if self.focus == pane {
            self.theme.border_focused
        } else {
            self.theme.border
        };
        Block::default()
            .title(title.to_string())
            .borders(Borders::ALL)
            .border_style(style)
    }

    fn draw_status(&self, frame: &mut Frame, area: Rect) {
        let span = match &self.status {
            Some(msg) if msg.starts_with("error:") => Span::styled(msg.clone(), self.theme.danger),
            Some(msg) => Span::styled(msg.clone(), self.theme.accent),
            None => {
                let b = &self.bindings;
                let mut help =
                    keymap::help_line([&b.quit, &b.focus, &b.up, &b.down, &b.open, &b.links]);
                if let Some(pct) = self.view.state.percent() {
                    help.push_str(&format!("  {pct}%"));
                }
                Span::styled(help, self.theme.text_muted)
            }
        };
        frame.render_widget(Line::from(span), area);
    }
}

fn move_selection(state: &mut ListState, len: usize, delta: isize) {
    if len == 0 {
        state.select(None);
        return;
    }
    let current = state.selected().unwrap_or(0) as isize;
    let next = (current + delta).clamp(0, len as isize - 1);
    state.select(Some(next as usize));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::Endpoints;
    use crate::fetch::FileFetcher;
    use crate::fetch::Fetcher;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use url::Url;

    const BOARDS: &str = r#"{
        "Разное": [{"id": "b", "name": "Бред"}],
        "Тематика": [{"id": "sci", "name": "Наука"}, {"id": "spc", "name": "Космос"}]
    }"#;

    const INDEX: &str = r#"{"threads": [
        {"posts": [
            {"num": 100, "subject": "First", "name": "Anon", "comment": "op text"},
            {"num": "105", "name": "Anon", "comment": "<a href=\"/b/res/200.html#201\" data-thread=\"200\" data-num=\"201\">&gt;&gt;201</a> reply"}
        ]},
        {"posts": []},
        {"posts": [{"num": 200, "subject": "", "name": "Anon", "comment": "second<br>thread"}]}
    ]}"#;

    const THREAD: &str = r#"{"threads": [{"posts": [
        {"num": 200, "name": "Anon", "comment": "second<br>thread"},
        {"num": 201, "name": "Anon", "comment": "full reply"}
    ]}]}"#;

    struct Stub;

    impl Fetcher for Stub {
        fn get_json(&self, url: &Url) -> Result<Vec<u8>> {
            match FileFetcher::file_for(url) {
                Some("boards.json") => Ok(BOARDS.as_bytes().to_vec()),
                Some("board_index.json") if url.path() == "/b/index.json" => {
                    Ok(INDEX.as_bytes().to_vec())
                }
                Some("full_thread.json") => Ok(THREAD.as_bytes().to_vec()),
                _ => anyhow::bail!("{url} returned status 404 Not Found"),
            }
        }
    }

    fn app() -> App {
        let store = ImageBoard::new(
            Box::new(Stub),
            Endpoints::new(Url::parse("https://2ch.hk").unwrap()),
        );
        let mut app = App::new(store, ThreadViewOptions::default());
        app.load_catalog().unwrap();
        app
    }

    fn key(code: KeyCode) -> InputEvent {
        InputEvent::Key(KeyEvent::new(code))
    }

    fn draw(app: &mut App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 20)).unwrap();
        terminal.draw(|f| app.draw(f)).unwrap();
        let buf = terminal.backend().buffer().clone();
        (0..buf.area.height)
            .map(|y| {
                (0..buf.area.width)
                    .map(|x| buf.cell((x, y)).unwrap().symbol().to_string())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn catalog_starts_collapsed_and_sorted() {
        let app = app();
        assert_eq!(
            app.tree_rows(),
            vec![
                TreeRow::Category {
                    name: "Разное".into(),
                    expanded: false
                },
                TreeRow::Category {
                    name: "Тематика".into(),
                    expanded: false
                },
            ]
        );
    }

    #[test]
    fn enter_expands_category_then_opens_board() {
        let mut app = app();
        app.handle_event(key(KeyCode::Enter));
        assert_eq!(app.tree_rows().len(), 3);

        app.handle_event(key(KeyCode::Down));
        app.handle_event(key(KeyCode::Enter));
        assert_eq!(app.board(), Some("b"));
        assert_eq!(app.focus(), Focus::Threads);
        let subjects: Vec<_> = app.threads().iter().map(|(_, s)| s.as_str()).collect();
        assert_eq!(subjects, vec!["First", "second"]);
        assert!(app.view().markup().contains("op text"));
    }

    #[test]
    fn moving_in_thread_list_previews_and_enter_opens() {
        let mut app = app();
        app.select_board("b").unwrap();
        app.handle_event(key(KeyCode::Down));
        assert!(app.view().markup().contains("second<br>thread"));
        assert!(!app.view().markup().contains("full reply"));

        app.handle_event(key(KeyCode::Enter));
        assert_eq!(app.focus(), Focus::Thread);
        assert!(app.view().markup().contains("full reply"));
    }

    #[test]
    fn focus_is_clamped_at_both_ends() {
        let mut app = app();
        app.handle_event(key(KeyCode::Left));
        assert_eq!(app.focus(), Focus::Boards);
        for _ in 0..5 {
            app.handle_event(key(KeyCode::Right));
        }
        assert_eq!(app.focus(), Focus::Thread);
        app.handle_event(key(KeyCode::Left));
        assert_eq!(app.focus(), Focus::Threads);
    }

    #[test]
    fn fetch_failures_go_to_the_status_line() {
        let mut app = app();
        app.handle_event(key(KeyCode::Down));
        app.handle_event(key(KeyCode::Enter));
        app.handle_event(key(KeyCode::Down));
        app.handle_event(key(KeyCode::Enter));
        assert!(app.status().unwrap().contains("404"));
        assert!(!app.should_quit());
        assert!(draw(&mut app).contains("404"));
    }

    #[test]
    fn reply_links_open_the_linked_thread() {
        let mut app = app();
        app.select_board("b").unwrap();
        let _ = draw(&mut app);
        app.handle_event(key(KeyCode::Right));
        app.handle_event(key(KeyCode::Tab));
        app.handle_event(key(KeyCode::Enter));
        assert!(app.view().markup().contains("full reply"));
        assert_eq!(app.status(), Some("/b/ thread 200, post 201"));
    }

    #[test]
    fn quit_keys() {
        let mut app = app();
        app.handle_event(InputEvent::Key(KeyEvent::char('q')));
        assert!(app.should_quit());
    }

    #[test]
    fn draws_three_panes_and_help() {
        let mut app = app();
        app.select_board("b").unwrap();
        let screen = draw(&mut app);
        assert!(screen.contains("Boards"));
        assert!(screen.contains("/b/"));
        assert!(screen.contains("First"));
        assert!(screen.contains("op text"));
        assert!(screen.contains("q quit"));
    }
}
