//! The single user's session: flow state, workspace sections, settings and
//! the thumbnail editor behind one async lock. Network calls run with the
//! lock released; their results are applied only if still current.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::compositor::Compositor;
use crate::credential::CredentialStore;
use crate::error::Result;
use crate::flow::{FlowCommand, FlowEvent, FlowState, Screen, transition};
use crate::gemini::GeminiClient;
use crate::generation::thumbnail::ThumbnailRevision;
use crate::generation::{SelfTestKind, SelfTestReport, SelfTestResult};
use crate::persona::PersonaImage;
use crate::settings::{LyricsSettings, LyricsSettingsPatch, ThumbnailSettings};
use crate::storage::ExportStorage;
use crate::thumbnail::{EditOutcome, GeneratedThumbnail, ThumbnailEditor};
use crate::workspace::{Section, Workspace};

/// How long the settings overlay stays up after a key is saved.
pub const SETTINGS_CLOSE_DELAY: Duration = Duration::from_secs(1);

struct SessionState {
    flow: FlowState,
    workspace: Workspace,
    lyrics: LyricsSettings,
    thumbnail: ThumbnailSettings,
    persona: Option<PersonaImage>,
}

impl SessionState {
    fn project(&self) -> Option<Project> {
        if self.flow.screen != Screen::Workspace {
            return None;
        }
        Some(Project {
            genre: self.flow.genre.clone()?,
            title: self.flow.title.clone()?,
            lyrics: self.lyrics.clone(),
            thumbnail: self.thumbnail.clone(),
            persona: self.persona.clone(),
        })
    }
}

/// Inputs captured when a workspace request starts.
struct Project {
    genre: String,
    title: String,
    lyrics: LyricsSettings,
    thumbnail: ThumbnailSettings,
    persona: Option<PersonaImage>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonaSummary {
    pub file_name: String,
    pub mime_type: String,
    pub size: usize,
}

impl From<&PersonaImage> for PersonaSummary {
    fn from(persona: &PersonaImage) -> Self {
        Self {
            file_name: persona.file_name.clone(),
            mime_type: persona.mime_type().to_string(),
            size: persona.image.bytes.len(),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThumbnailSummary {
    pub mime_type: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub prompt: String,
    pub generated_at: DateTime<Utc>,
    pub settings: ThumbnailSettings,
}

impl From<&GeneratedThumbnail> for ThumbnailSummary {
    fn from(thumbnail: &GeneratedThumbnail) -> Self {
        let dimensions = thumbnail.composite().dimensions().ok();
        Self {
            mime_type: thumbnail.composite().mime_type.clone(),
            width: dimensions.map(|(w, _)| w),
            height: dimensions.map(|(_, h)| h),
            prompt: thumbnail.prompt.clone(),
            generated_at: thumbnail.generated_at,
            settings: thumbnail.settings().clone(),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub has_credential: bool,
    pub flow: FlowState,
    pub workspace: Workspace,
    pub lyrics_settings: LyricsSettings,
    pub thumbnail_settings: ThumbnailSettings,
    pub persona: Option<PersonaSummary>,
    pub thumbnail: Option<ThumbnailSummary>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedFile {
    pub name: String,
    pub url: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportManifest {
    pub prefix: String,
    pub files: Vec<ExportedFile>,
}

fn suno_section(w: &mut Workspace) -> &mut Section<Vec<String>> {
    &mut w.suno_prompts
}

fn metadata_section(w: &mut Workspace) -> &mut Section<crate::generation::VideoMetadata> {
    &mut w.metadata
}

fn lyrics_section(w: &mut Workspace) -> &mut Section<Vec<String>> {
    &mut w.lyrics
}

fn thumbnail_prompt_section(w: &mut Workspace) -> &mut Section<String> {
    &mut w.thumbnail_prompt
}

pub struct Session {
    credentials: Arc<CredentialStore>,
    client: GeminiClient,
    editor: ThumbnailEditor,
    storage: ExportStorage,
    state: Mutex<SessionState>,
    settings_close_delay: Duration,
}

impl Session {
    pub fn new(
        credentials: Arc<CredentialStore>,
        client: GeminiClient,
        editor: ThumbnailEditor,
        storage: ExportStorage,
    ) -> Self {
        Self {
            credentials,
            client,
            editor,
            storage,
            state: Mutex::new(SessionState {
                flow: FlowState::default(),
                workspace: Workspace::default(),
                lyrics: LyricsSettings::default(),
                thumbnail: ThumbnailSettings::for_title(""),
                persona: None,
            }),
            settings_close_delay: SETTINGS_CLOSE_DELAY,
        }
    }

    pub fn with_compositor(
        credentials: Arc<CredentialStore>,
        client: GeminiClient,
        compositor: Arc<Compositor>,
        storage: ExportStorage,
    ) -> Self {
        let editor = ThumbnailEditor::new(compositor, Default::default());
        Self::new(credentials, client, editor, storage)
    }

    pub fn with_settings_close_delay(mut self, delay: Duration) -> Self {
        self.settings_close_delay = delay;
        self
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.lock().await;
        SessionSnapshot {
            has_credential: self.credentials.has(),
            flow: state.flow.clone(),
            workspace: state.workspace.clone(),
            lyrics_settings: state.lyrics.clone(),
            thumbnail_settings: state.thumbnail.clone(),
            persona: state.persona.as_ref().map(PersonaSummary::from),
            thumbnail: self.editor.snapshot().as_ref().map(ThumbnailSummary::from),
        }
    }

    pub async fn launch(&self) -> SessionSnapshot {
        let has_credential = self.credentials.has();
        self.dispatch(FlowEvent::Launched { has_credential }).await
    }

    /// Feeds `event` through the flow state machine and runs the resulting
    /// commands until none are left.
    pub async fn dispatch(&self, event: FlowEvent) -> SessionSnapshot {
        let mut queue = VecDeque::from([event]);
        while let Some(event) = queue.pop_front() {
            let commands = {
                let mut state = self.state.lock().await;
                let (flow, commands) = transition(std::mem::take(&mut state.flow), event);
                state.flow = flow;
                let mut pending = Vec::new();
                for command in commands {
                    match command {
                        FlowCommand::ResetWorkspace => {
                            state.workspace.reset();
                            self.editor.clear();
                            let title = state.flow.title.clone().unwrap_or_default();
                            state.thumbnail = ThumbnailSettings {
                                style: state.thumbnail.style,
                                font: state.thumbnail.font,
                                ..ThumbnailSettings::for_title(&title)
                            };
                        }
                        other => pending.push(other),
                    }
                }
                pending
            };

            for command in commands {
                if let FlowCommand::GenerateTitles { token, genre } = command {
                    debug!(%genre, "generating titles");
                    let result = self
                        .client
                        .generate_titles(&genre)
                        .await
                        .map_err(|err| err.user_message());
                    queue.push_back(FlowEvent::TitlesGenerated { token, result });
                }
            }
        }
        self.snapshot().await
    }

    /// Saves the key and, on success, closes the settings overlay after
    /// `settings_close_delay`.
    pub fn save_credential(self: &Arc<Self>, key: &str) -> bool {
        if !self.credentials.save(key) {
            return false;
        }
        info!("API key saved");
        let session = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(session.settings_close_delay).await;
            let has_credential = session.credentials.has();
            session.dispatch(FlowEvent::SettingsClosed { has_credential }).await;
        });
        true
    }

    pub fn remove_credential(&self) {
        self.credentials.remove();
        info!("API key removed");
    }

    /// Client for a self-test: the typed key if one is given, else the saved one.
    fn self_test_client(&self, key: Option<&str>) -> GeminiClient {
        match key.map(str::trim).filter(|key| !key.is_empty()) {
            Some(key) => self.client.with_credentials(CredentialStore::with_override(key)),
            None => self.client.clone(),
        }
    }

    pub async fn run_self_test(&self, kind: SelfTestKind, key: Option<&str>) -> SelfTestResult {
        self.self_test_client(key).run_self_test(kind).await
    }

    pub async fn run_all_self_tests(&self, key: Option<&str>) -> SelfTestReport {
        self.self_test_client(key).run_all_self_tests().await
    }

    pub async fn update_lyrics_settings(&self, patch: LyricsSettingsPatch) -> LyricsSettings {
        let mut state = self.state.lock().await;
        state.lyrics.apply(patch);
        state.lyrics.clone()
    }

    pub async fn set_persona(
        &self,
        file_name: &str,
        declared_mime: Option<&str>,
        bytes: Vec<u8>,
    ) -> Result<PersonaSummary> {
        let persona = PersonaImage::from_upload(file_name, declared_mime, bytes)?;
        let summary = PersonaSummary::from(&persona);
        self.state.lock().await.persona = Some(persona);
        info!(file = %summary.file_name, size = summary.size, "persona image set");
        Ok(summary)
    }

    pub async fn clear_persona(&self) {
        self.state.lock().await.persona = None;
    }

    /// Runs one workspace step. Returns whether a result (or error) was
    /// recorded; false when not in the workspace, already loading, or the
    /// response arrived after the workspace was reset.
    async fn run_section<T, F, Fut>(&self, section: fn(&mut Workspace) -> &mut Section<T>, call: F) -> bool
    where
        F: FnOnce(Project) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let (token, project) = {
            let mut state = self.state.lock().await;
            let Some(project) = state.project() else {
                return false;
            };
            let Some(token) = section(&mut state.workspace).begin() else {
                return false;
            };
            (token, project)
        };
        let result = call(project).await;
        let mut state = self.state.lock().await;
        let applied = section(&mut state.workspace).finish(token, result);
        if !applied {
            debug!("dropping response for a superseded request");
        }
        applied
    }

    pub async fn generate_suno_prompts(&self) -> bool {
        self.run_section(suno_section, |project| async move {
            self.client
                .generate_suno_prompts(&project.title, &project.genre)
                .await
        })
        .await
    }

    pub async fn generate_video_metadata(&self) -> bool {
        self.run_section(metadata_section, |project| async move {
            self.client
                .generate_video_metadata(&project.title, &project.genre)
                .await
        })
        .await
    }

    pub async fn generate_lyrics(&self) -> bool {
        self.run_section(lyrics_section, |project| async move {
            self.client
                .generate_lyrics(&project.title, &project.genre, &project.lyrics)
                .await
        })
        .await
    }

    /// With feedback, the request revises the prompt behind the current
    /// thumbnail instead of starting over.
    pub async fn generate_thumbnail_prompt(&self, feedback: Option<String>) -> bool {
        let feedback = feedback.filter(|text| !text.trim().is_empty());
        let previous_prompt = match feedback {
            Some(_) => self.previous_thumbnail_prompt().await,
            None => None,
        };
        self.run_section(thumbnail_prompt_section, |project| async move {
            let revision = feedback
                .as_deref()
                .and_then(|feedback| ThumbnailRevision::new(feedback, previous_prompt.as_deref()));
            self.client
                .generate_thumbnail_prompt(
                    &project.title,
                    &project.genre,
                    project.thumbnail.style,
                    project.persona.as_ref(),
                    revision,
                )
                .await
        })
        .await
    }

    /// Prompt of the rendered thumbnail, else the last prompt written.
    async fn previous_thumbnail_prompt(&self) -> Option<String> {
        if let Some(thumbnail) = self.editor.snapshot() {
            return Some(thumbnail.prompt);
        }
        self.state.lock().await.workspace.thumbnail_prompt.result().cloned()
    }

    /// Writes a new image prompt and renders it. Feedback turns the prompt
    /// step into a revision of the previous one.
    pub async fn generate_thumbnail(&self, feedback: Option<String>) -> bool {
        if !self.generate_thumbnail_prompt(feedback).await {
            return false;
        }
        let prompt = {
            let state = self.state.lock().await;
            if state.workspace.thumbnail_prompt.error().is_some() {
                return false;
            }
            state.workspace.thumbnail_prompt.result().cloned()
        };
        match prompt {
            Some(prompt) => self.render_thumbnail(prompt).await,
            None => false,
        }
    }

    /// Renders `prompt` into a fresh original image and composites the title.
    pub async fn render_thumbnail(&self, prompt: String) -> bool {
        let (token, project) = {
            let mut state = self.state.lock().await;
            let Some(project) = state.project() else {
                return false;
            };
            let Some(token) = state.workspace.thumbnail.begin() else {
                return false;
            };
            (token, project)
        };

        let result = match self
            .client
            .generate_thumbnail_image(&prompt, project.persona.as_ref())
            .await
        {
            Ok(image) => {
                if !self.state.lock().await.workspace.thumbnail.is_current(token) {
                    debug!("dropping thumbnail for a superseded request");
                    return false;
                }
                let settings = self.state.lock().await.thumbnail.clone();
                Ok(self.editor.install(image, prompt, settings).await.generated_at)
            }
            Err(err) => Err(err),
        };

        let installed_at = result.as_ref().ok().copied();
        let applied = self.state.lock().await.workspace.thumbnail.finish(token, result);
        if !applied {
            if let Some(at) = installed_at {
                if self.editor.snapshot().is_some_and(|t| t.generated_at == at) {
                    self.editor.clear();
                }
            }
        }
        applied
    }

    /// Stores new thumbnail settings and recomposites the preview.
    pub async fn update_thumbnail_settings(&self, settings: ThumbnailSettings) -> EditOutcome {
        let settings = settings.normalized();
        self.state.lock().await.thumbnail = settings.clone();
        self.editor.apply_settings(settings).await
    }

    pub fn thumbnail(&self) -> Option<GeneratedThumbnail> {
        self.editor.snapshot()
    }

    /// Writes the thumbnail and all generated text to a new export directory.
    pub async fn export(&self) -> anyhow::Result<ExportManifest> {
        let (title, workspace) = {
            let state = self.state.lock().await;
            let Some(title) = state.flow.title.clone() else {
                bail!("no project selected");
            };
            (title, state.workspace.clone())
        };
        let thumbnail = self.editor.snapshot();

        let mut entries: Vec<(String, Vec<u8>)> = Vec::new();
        if let Some(thumbnail) = &thumbnail {
            let composite = thumbnail.composite();
            let original = thumbnail.original();
            entries.push((format!("thumbnail.{}", composite.extension()), composite.bytes.clone()));
            entries.push((
                format!("thumbnail-original.{}", original.extension()),
                original.bytes.clone(),
            ));
            entries.push(("thumbnail-prompt.txt".into(), thumbnail.prompt.clone().into_bytes()));
        }
        if let Some(prompts) = workspace.suno_prompts.result() {
            entries.push(("suno-prompts.txt".into(), prompts.join("\n\n").into_bytes()));
        }
        if let Some(lyrics) = workspace.lyrics.result() {
            entries.push(("lyrics.txt".into(), lyrics.join("\n\n---\n\n").into_bytes()));
        }
        if let Some(metadata) = workspace.metadata.result() {
            let text = format!("{}\n\nKeywords: {}\n", metadata.full_description(), metadata.keywords);
            entries.push(("metadata.txt".into(), text.into_bytes()));
        }
        if entries.is_empty() {
            bail!("nothing has been generated yet");
        }

        let prefix = self.storage.fresh_export_prefix(&title, Utc::now()).await?;
        let mut files = Vec::with_capacity(entries.len());
        for (name, bytes) in entries {
            let key = format!("{prefix}/{name}");
            self.storage.put(&key, &bytes).await?;
            files.push(ExportedFile {
                url: self.storage.public_url(&key),
                name,
            });
        }
        info!(%prefix, files = files.len(), "exported project");
        Ok(ExportManifest { prefix, files })
    }
}
