//! Wizard navigation: genre, then title, then the creation workspace.
//!
//! `transition` is pure. Anything that needs I/O comes back as a
//! `FlowCommand` for the caller to run, and its outcome is fed back in as
//! another event.

use std::collections::HashMap;

use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Screen {
    #[default]
    NeedsCredential,
    GenreSelection,
    TitleSelection,
    Workspace,
}

/// Identifies one title-generation request; results carrying any other
/// token are dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct TitleToken(u64);

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowState {
    pub screen: Screen,
    /// Overlay on top of `screen`; closing it returns to whatever was under it.
    pub settings_open: bool,
    pub genre: Option<String>,
    pub title: Option<String>,
    /// Candidates shown on the title step.
    pub titles: Vec<String>,
    pub title_error: Option<String>,
    pub loading: bool,
    #[serde(skip)]
    title_cache: HashMap<String, Vec<String>>,
    #[serde(skip)]
    pending_titles: Option<TitleToken>,
    #[serde(skip)]
    next_token: u64,
}

impl FlowState {
    pub fn cached_titles(&self, genre: &str) -> Option<&[String]> {
        self.title_cache.get(genre).map(Vec::as_slice)
    }

    fn issue_token(&mut self) -> TitleToken {
        self.next_token += 1;
        TitleToken(self.next_token)
    }

    /// Shows cached titles for the current genre or asks for a fresh batch.
    fn enter_title_step(&mut self, commands: &mut Vec<FlowCommand>) {
        self.screen = Screen::TitleSelection;
        self.title = None;
        self.title_error = None;
        let Some(genre) = self.genre.clone() else {
            self.screen = Screen::GenreSelection;
            return;
        };
        match self.title_cache.get(&genre) {
            Some(cached) if !cached.is_empty() => {
                self.titles = cached.clone();
                self.loading = false;
                self.pending_titles = None;
            }
            _ => self.request_titles(genre, commands),
        }
    }

    fn request_titles(&mut self, genre: String, commands: &mut Vec<FlowCommand>) {
        let token = self.issue_token();
        self.titles.clear();
        self.title_error = None;
        self.loading = true;
        self.pending_titles = Some(token);
        commands.push(FlowCommand::GenerateTitles { token, genre });
    }

    fn clear_selection(&mut self) {
        self.genre = None;
        self.title = None;
        self.titles.clear();
        self.title_error = None;
        self.loading = false;
        self.pending_titles = None;
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum FlowEvent {
    Launched { has_credential: bool },
    SettingsOpened,
    SettingsClosed { has_credential: bool },
    GenreSelected(String),
    RegenerateTitles,
    TitlesGenerated {
        token: TitleToken,
        result: Result<Vec<String>, String>,
    },
    TitleSelected(String),
    Back,
    Restart,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FlowCommand {
    GenerateTitles { token: TitleToken, genre: String },
    /// Drop everything generated for the previous project.
    ResetWorkspace,
}

pub fn transition(mut state: FlowState, event: FlowEvent) -> (FlowState, Vec<FlowCommand>) {
    let mut commands = Vec::new();
    match event {
        FlowEvent::Launched { has_credential } => {
            if has_credential {
                state.screen = Screen::GenreSelection;
                state.settings_open = false;
            } else {
                state.screen = Screen::NeedsCredential;
                state.settings_open = true;
            }
        }
        FlowEvent::SettingsOpened => state.settings_open = true,
        FlowEvent::SettingsClosed { has_credential } => {
            state.settings_open = false;
            if has_credential && state.screen == Screen::NeedsCredential {
                state.screen = Screen::GenreSelection;
            }
        }
        FlowEvent::GenreSelected(genre) => {
            let genre = genre.trim().to_string();
            if state.screen != Screen::GenreSelection || genre.is_empty() {
                state.loading = false;
                return (state, commands);
            }
            state.title_cache.remove(&genre);
            state.genre = Some(genre);
            state.enter_title_step(&mut commands);
        }
        FlowEvent::RegenerateTitles => {
            if state.screen == Screen::TitleSelection && !state.loading {
                if let Some(genre) = state.genre.clone() {
                    state.title_cache.remove(&genre);
                    state.request_titles(genre, &mut commands);
                }
            }
        }
        FlowEvent::TitlesGenerated { token, result } => {
            if state.pending_titles != Some(token) {
                return (state, commands);
            }
            state.pending_titles = None;
            state.loading = false;
            match result {
                Ok(titles) => {
                    if let Some(genre) = state.genre.clone() {
                        state.title_cache.insert(genre, titles.clone());
                    }
                    state.titles = titles;
                    state.title_error = None;
                }
                Err(message) => state.title_error = Some(message),
            }
        }
        FlowEvent::TitleSelected(title) => {
            let title = title.trim().to_string();
            if state.screen != Screen::TitleSelection || title.is_empty() {
                return (state, commands);
            }
            state.title = Some(title);
            state.screen = Screen::Workspace;
            commands.push(FlowCommand::ResetWorkspace);
        }
        FlowEvent::Back => match state.screen {
            Screen::Workspace => {
                commands.push(FlowCommand::ResetWorkspace);
                state.enter_title_step(&mut commands);
            }
            Screen::TitleSelection => {
                state.clear_selection();
                state.screen = Screen::GenreSelection;
            }
            Screen::GenreSelection | Screen::NeedsCredential => {}
        },
        FlowEvent::Restart => {
            if state.screen == Screen::Workspace {
                commands.push(FlowCommand::ResetWorkspace);
            }
            if state.screen != Screen::NeedsCredential {
                state.clear_selection();
                state.screen = Screen::GenreSelection;
            }
        }
    }
    (state, commands)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready() -> FlowState {
        transition(FlowState::default(), FlowEvent::Launched { has_credential: true }).0
    }

    fn select_genre(state: FlowState, genre: &str) -> (FlowState, Vec<FlowCommand>) {
        transition(state, FlowEvent::GenreSelected(genre.to_string()))
    }

    fn token_of(commands: &[FlowCommand]) -> TitleToken {
        commands
            .iter()
            .find_map(|cmd| match cmd {
                FlowCommand::GenerateTitles { token, .. } => Some(*token),
                _ => None,
            })
            .expect("title generation requested")
    }

    fn deliver(state: FlowState, token: TitleToken, titles: &[&str]) -> FlowState {
        let result = Ok(titles.iter().map(|t| t.to_string()).collect());
        transition(state, FlowEvent::TitlesGenerated { token, result }).0
    }

    #[test]
    fn launch_without_credential_opens_settings() {
        let (state, commands) =
            transition(FlowState::default(), FlowEvent::Launched { has_credential: false });
        assert_eq!(state.screen, Screen::NeedsCredential);
        assert!(state.settings_open);
        assert!(commands.is_empty());

        let (state, _) = transition(state, FlowEvent::SettingsClosed { has_credential: true });
        assert_eq!(state.screen, Screen::GenreSelection);
        assert!(!state.settings_open);
    }

    #[test]
    fn closing_settings_without_credential_stays_put() {
        let state = transition(FlowState::default(), FlowEvent::Launched { has_credential: false }).0;
        let (state, _) = transition(state, FlowEvent::SettingsClosed { has_credential: false });
        assert_eq!(state.screen, Screen::NeedsCredential);
    }

    #[test]
    fn settings_overlay_returns_to_interrupted_screen() {
        let (state, commands) = select_genre(ready(), "Jazz");
        let state = deliver(state, token_of(&commands), &["a"]);
        let state = transition(state, FlowEvent::SettingsOpened).0;
        assert!(state.settings_open);
        let state = transition(state, FlowEvent::SettingsClosed { has_credential: true }).0;
        assert_eq!(state.screen, Screen::TitleSelection);
        assert_eq!(state.titles, vec!["a"]);
    }

    #[test]
    fn reselecting_a_genre_always_regenerates() {
        let (state, commands) = select_genre(ready(), "Lo-fi");
        let state = deliver(state, token_of(&commands), &["one", "two"]);
        assert_eq!(state.cached_titles("Lo-fi").unwrap().len(), 2);

        let (state, _) = transition(state, FlowEvent::Back);
        assert_eq!(state.screen, Screen::GenreSelection);
        assert_eq!(state.genre, None);

        let (state, commands) = select_genre(state, "Lo-fi");
        assert!(matches!(
            commands.as_slice(),
            [FlowCommand::GenerateTitles { genre, .. }] if genre == "Lo-fi"
        ));
        assert!(state.loading);
        assert_eq!(state.cached_titles("Lo-fi"), None);
    }

    #[test]
    fn returning_to_title_step_reuses_cache() {
        let (state, commands) = select_genre(ready(), "Pop");
        let state = deliver(state, token_of(&commands), &["x", "y"]);
        let (state, commands) = transition(state, FlowEvent::TitleSelected("x".into()));
        assert_eq!(state.screen, Screen::Workspace);
        assert_eq!(commands, vec![FlowCommand::ResetWorkspace]);

        let (state, commands) = transition(state, FlowEvent::Back);
        assert_eq!(state.screen, Screen::TitleSelection);
        assert_eq!(state.title, None);
        assert_eq!(state.genre.as_deref(), Some("Pop"));
        assert_eq!(state.titles, vec!["x", "y"]);
        assert!(!state.loading);
        assert_eq!(commands, vec![FlowCommand::ResetWorkspace]);
    }

    #[test]
    fn empty_cache_entry_is_not_reused() {
        let (state, commands) = select_genre(ready(), "Pop");
        let state = deliver(state, token_of(&commands), &[]);
        let state = transition(state, FlowEvent::TitleSelected("typed".into())).0;
        let (_, commands) = transition(state, FlowEvent::Back);
        assert!(commands.iter().any(|c| matches!(c, FlowCommand::GenerateTitles { .. })));
    }

    #[test]
    fn failure_clears_loading_and_keeps_error() {
        let (state, commands) = select_genre(ready(), "Jazz");
        let token = token_of(&commands);
        let (state, _) = transition(
            state,
            FlowEvent::TitlesGenerated {
                token,
                result: Err("The API response did not contain titles.".into()),
            },
        );
        assert!(!state.loading);
        assert_eq!(
            state.title_error.as_deref(),
            Some("The API response did not contain titles.")
        );
        assert_eq!(state.cached_titles("Jazz"), None);

        let (state, commands) = transition(state, FlowEvent::RegenerateTitles);
        assert!(state.loading);
        assert_eq!(state.title_error, None);
        assert_ne!(token_of(&commands), token);
    }

    #[test]
    fn blank_genre_is_rejected_and_clears_loading() {
        let mut state = ready();
        state.loading = true;
        let (state, commands) = select_genre(state, "   ");
        assert!(!state.loading);
        assert!(commands.is_empty());
        assert_eq!(state.screen, Screen::GenreSelection);
    }

    #[test]
    fn stale_title_results_are_dropped() {
        let (state, commands) = select_genre(ready(), "Jazz");
        let stale = token_of(&commands);
        let (state, _) = transition(state, FlowEvent::Back);
        let (state, commands) = select_genre(state, "Pop");
        let fresh = token_of(&commands);

        let state = deliver(state, stale, &["jazz title"]);
        assert!(state.loading);
        assert!(state.titles.is_empty());
        assert_eq!(state.cached_titles("Jazz"), None);

        let state = deliver(state, fresh, &["pop title"]);
        assert_eq!(state.titles, vec!["pop title"]);
        assert_eq!(state.cached_titles("Pop").unwrap(), ["pop title".to_string()]);
    }

    #[test]
    fn restart_clears_everything() {
        let (state, commands) = select_genre(ready(), "Indie");
        let state = deliver(state, token_of(&commands), &["t"]);
        let state = transition(state, FlowEvent::TitleSelected("t".into())).0;
        let (state, commands) = transition(state, FlowEvent::Restart);
        assert_eq!(state.screen, Screen::GenreSelection);
        assert_eq!(state.genre, None);
        assert_eq!(state.title, None);
        assert!(!state.loading);
        assert_eq!(commands, vec![FlowCommand::ResetWorkspace]);
    }

    #[test]
    fn regenerate_is_ignored_while_loading() {
        let (state, _) = select_genre(ready(), "Jazz");
        let (state, commands) = transition(state, FlowEvent::RegenerateTitles);
        assert!(commands.is_empty());
        assert!(state.loading);
    }
}
