use narrator_chatlog::{ChatLogStore, NO_SUMMARY};
use narrator_pipeline::{
    ingest_document, setup_agent, store_upload, use_existing_agent, AgentBackend, AgentError,
    AgentSpec, ChatSession, DocumentExtractor, ExtractionError, LanguageModel, LlmError, Narrator,
    PipelineError, SpeechBackend, SpeechError, Summarizer,
};
use narrator_types::{DataLayout, DirectoryRole, Exchange, VoiceInfo};
use narrator_vault::{KeyStore, SettingsStore, VaultError};
use std::cell::{Cell, RefCell};
use std::path::Path;

struct FakeSpeech {
    voices: Vec<VoiceInfo>,
    list_calls: Cell<usize>,
}

impl FakeSpeech {
    fn new() -> Self {
        Self {
            voices: vec![VoiceInfo::new("Rachel", "v-rachel"), VoiceInfo::new("Adam", "v-adam")],
            list_calls: Cell::new(0),
        }
    }
}

impl SpeechBackend for FakeSpeech {
    fn list_voices(&self) -> Result<Vec<VoiceInfo>, SpeechError> {
        self.list_calls.set(self.list_calls.get() + 1);
        Ok(self.voices.clone())
    }

    fn synthesize(&self, text: &str, voice_id: &str) -> Result<Vec<u8>, SpeechError> {
        Ok(format!("[{voice_id}]{text}").into_bytes())
    }
}

struct OfflineSpeech;

impl SpeechBackend for OfflineSpeech {
    fn list_voices(&self) -> Result<Vec<VoiceInfo>, SpeechError> {
        Err(SpeechError::Listing("connection refused".to_string()))
    }

    fn synthesize(&self, _text: &str, _voice_id: &str) -> Result<Vec<u8>, SpeechError> {
        panic!("synthesize must not be reached without a voice");
    }
}

/// Answers every prompt with a fixed reply and records what it was asked.
struct ScriptedModel {
    reply: Result<String, String>,
    prompts: RefCell<Vec<String>>,
}

impl ScriptedModel {
    fn replying(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            prompts: RefCell::new(Vec::new()),
        }
    }

    fn failing(reason: &str) -> Self {
        Self {
            reply: Err(reason.to_string()),
            prompts: RefCell::new(Vec::new()),
        }
    }

    fn last_prompt(&self) -> String {
        self.prompts.borrow().last().cloned().unwrap_or_default()
    }
}

impl LanguageModel for ScriptedModel {
    fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        self.prompts.borrow_mut().push(prompt.to_string());
        self.reply.clone().map_err(LlmError::BackendUnavailable)
    }
}

struct UppercaseExtractor;

impl DocumentExtractor for UppercaseExtractor {
    fn extract_text(&self, path: &Path) -> Result<String, ExtractionError> {
        if path.extension().is_some_and(|ext| ext == "exe") {
            return Err(ExtractionError::Unsupported("exe".to_string()));
        }
        let raw = std::fs::read_to_string(path).map_err(|e| ExtractionError::Failed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(raw.to_uppercase())
    }
}

struct FakeAgents {
    created: RefCell<Vec<AgentSpec>>,
    fail: bool,
}

impl FakeAgents {
    fn new() -> Self {
        Self {
            created: RefCell::new(Vec::new()),
            fail: false,
        }
    }
}

impl AgentBackend for FakeAgents {
    fn create_agent(&self, api_key: &str, spec: &AgentSpec) -> Result<String, AgentError> {
        if self.fail {
            return Err(AgentError::Creation("quota exceeded".to_string()));
        }
        assert_eq!(api_key, "sk-live");
        self.created.borrow_mut().push(spec.clone());
        Ok(format!("agent-{}", self.created.borrow().len()))
    }
}

fn layout() -> (tempfile::TempDir, DataLayout) {
    let temp = tempfile::tempdir().unwrap();
    let layout = DataLayout::open(temp.path()).unwrap();
    (temp, layout)
}

#[test]
fn narrate_resolves_voice_name() {
    let (_temp, layout) = layout();
    let narrator = Narrator::new(FakeSpeech::new(), &layout);

    let audio = narrator.narrate("Once upon a time", "Adam").unwrap();
    assert_eq!(audio, b"[v-adam]Once upon a time");
}

#[test]
fn narrate_unknown_voice_fails() {
    let (_temp, layout) = layout();
    let narrator = Narrator::new(FakeSpeech::new(), &layout);

    let err = narrator.narrate("hello", "Nobody").unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Speech(SpeechError::VoiceNotFound(ref name)) if name == "Nobody"
    ));
}

#[test]
fn voice_listing_failure_is_propagated() {
    let (_temp, layout) = layout();
    let narrator = Narrator::new(OfflineSpeech, &layout);

    let err = narrator.narrate("hello", "Adam").unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Speech(SpeechError::Listing(ref reason)) if reason == "connection refused"
    ));
    assert!(matches!(narrator.voices(), Err(SpeechError::Listing(_))));
}

#[test]
fn narrate_rejects_blank_text_before_calling_backend() {
    let (_temp, layout) = layout();
    let speech = FakeSpeech::new();
    let narrator = Narrator::new(&speech, &layout);

    let err = narrator.narrate("   ", "Adam").unwrap_err();
    assert!(matches!(err, PipelineError::Speech(SpeechError::EmptyText)));
    assert_eq!(speech.list_calls.get(), 0);
}

#[test]
fn intro_is_prepended_with_single_voice_lookup() {
    let (_temp, layout) = layout();
    let speech = FakeSpeech::new();
    let narrator = Narrator::new(&speech, &layout);

    let audio = narrator
        .narrate_with_intro("Chapter one.", "It was dark.", "Rachel")
        .unwrap();

    assert_eq!(audio, b"[v-rachel]Chapter one.[v-rachel]It was dark.");
    assert_eq!(speech.list_calls.get(), 1);
}

#[test]
fn save_audio_never_overwrites() {
    let (_temp, layout) = layout();
    let narrator = Narrator::new(FakeSpeech::new(), &layout);

    let first = narrator.save_audio(b"one", "story.mp3").unwrap();
    let second = narrator.save_audio(b"two", "story.mp3").unwrap();

    assert_eq!(first, layout.dir(DirectoryRole::Audio).join("story.mp3"));
    assert_eq!(second, layout.dir(DirectoryRole::Audio).join("story_1.mp3"));
    assert_eq!(std::fs::read(&first).unwrap(), b"one");
    assert_eq!(std::fs::read(&second).unwrap(), b"two");
}

#[test]
fn save_audio_rejects_path_components() {
    let (_temp, layout) = layout();
    let narrator = Narrator::new(FakeSpeech::new(), &layout);

    let err = narrator.save_audio(b"x", "../escape.mp3").unwrap_err();
    assert!(matches!(err, PipelineError::InvalidFileName(_)));
    assert!(!layout.base().join("escape.mp3").exists());
}

#[test]
fn chat_send_composes_history_and_records_exchange() {
    let (_temp, layout) = layout();
    let log = ChatLogStore::new(&layout);
    log.append_exchange("s1", "Who is the hero?", "Ada.").unwrap();

    let model = ScriptedModel::replying("She leaves home.");
    let chat = ChatSession::new(&model, &log, "You are a reading assistant.");

    let reply = chat.send("s1", "What happens next?").unwrap();
    assert_eq!(reply, "She leaves home.");
    assert_eq!(
        model.last_prompt(),
        "You are a reading assistant.\nUser: Who is the hero?\nBot: Ada.\nUser: What happens next?\nBot:"
    );

    let transcript = log.load_transcript("s1").unwrap();
    assert_eq!(transcript.len(), 4);
    assert_eq!(transcript[2], Exchange::user("What happens next?"));
    assert_eq!(transcript[3], Exchange::bot("She leaves home."));
}

#[test]
fn failed_completion_leaves_transcript_untouched() {
    let (_temp, layout) = layout();
    let log = ChatLogStore::new(&layout);
    log.append_exchange("s1", "hi", "hello").unwrap();

    let model = ScriptedModel::failing("timeout");
    let chat = ChatSession::new(&model, &log, "base");

    let err = chat.send("s1", "still there?").unwrap_err();
    assert!(matches!(err, PipelineError::Llm(LlmError::BackendUnavailable(_))));
    assert_eq!(log.load_transcript("s1").unwrap().len(), 2);
}

#[test]
fn chat_rejects_bad_session_id_before_calling_model() {
    let (_temp, layout) = layout();
    let log = ChatLogStore::new(&layout);
    let model = ScriptedModel::replying("unused");
    let chat = ChatSession::new(&model, &log, "base");

    let err = chat.send("../outside", "hi").unwrap_err();
    assert!(matches!(err, PipelineError::ChatLog(_)));
    assert!(model.prompts.borrow().is_empty());
}

#[test]
fn summary_is_findable_after_summarize_into_session() {
    let (_temp, layout) = layout();
    let log = ChatLogStore::new(&layout);
    let model = ScriptedModel::replying("A hero leaves home.");
    let chat = ChatSession::new(&model, &log, "base");

    assert_eq!(log.latest_summary("s1").unwrap(), NO_SUMMARY);

    let summary = chat.summarize_into_session("s1", "long text").unwrap();
    assert_eq!(summary, "A hero leaves home.");
    assert!(model.last_prompt().ends_with("\nlong text"));
    assert_eq!(
        log.latest_summary("s1").unwrap(),
        "Summary: A hero leaves home."
    );
}

#[test]
fn notes_use_sentiment_then_additions() {
    let model = ScriptedModel::replying("calm");
    let summarizer = Summarizer::new(&model);

    summarizer
        .notes_with_sentiment("text", Some("use bullet points"))
        .unwrap();

    let prompts = model.prompts.borrow();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[0].starts_with("Analyze the sentiment"));
    assert!(prompts[1].contains("\ncalm"));
    assert!(prompts[1].ends_with("User Additions: use bullet points"));
}

#[test]
fn blank_additions_are_ignored() {
    let model = ScriptedModel::replying("calm");
    Summarizer::new(&model)
        .notes_with_sentiment("text", Some("  "))
        .unwrap();
    assert!(!model.last_prompt().contains("User Additions"));
}

#[test]
fn ingest_stores_then_extracts() {
    let (_temp, layout) = layout();

    let (path, text) =
        ingest_document(&UppercaseExtractor, &layout, "chapter.txt", b"call me ishmael").unwrap();

    assert_eq!(path, layout.dir(DirectoryRole::Uploads).join("chapter.txt"));
    assert_eq!(text, "CALL ME ISHMAEL");
}

#[test]
fn extraction_failure_keeps_the_upload() {
    let (_temp, layout) = layout();

    let err = ingest_document(&UppercaseExtractor, &layout, "tool.exe", b"MZ").unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Extraction(ExtractionError::Unsupported(_))
    ));
    assert!(layout.dir(DirectoryRole::Uploads).join("tool.exe").exists());

    let again = store_upload(&layout, "tool.exe", b"MZ").unwrap();
    assert_eq!(again.file_name().unwrap(), "tool_1.exe");
}

#[test]
fn agent_setup_persists_encrypted_credentials() {
    let (_temp, layout) = layout();
    let keys = KeyStore::new(&layout);
    keys.generate_key().unwrap();
    let settings = SettingsStore::new(&layout, &keys);
    let agents = FakeAgents::new();

    let spec = AgentSpec::new("Reader", "v-rachel", "gpt-4o-mini", "Read aloud.");
    let agent_id = setup_agent(&agents, &settings, "  sk-live ", &spec).unwrap();

    assert_eq!(agent_id, "agent-1");
    assert_eq!(agents.created.borrow()[0], spec);

    let loaded = settings.load().unwrap();
    assert_eq!(loaded.api_key(), Some("sk-live"));
    assert_eq!(loaded.agent_id(), Some("agent-1"));

    let on_disk = std::fs::read_to_string(settings.path()).unwrap();
    assert!(!on_disk.contains("sk-live"));
    assert!(on_disk.contains("agent-1"));
}

#[test]
fn agent_setup_requires_credential() {
    let (_temp, layout) = layout();
    let keys = KeyStore::new(&layout);
    let settings = SettingsStore::new(&layout, &keys);
    let agents = FakeAgents::new();

    let spec = AgentSpec::new("Reader", "v", "m", "p");
    let err = setup_agent(&agents, &settings, "   ", &spec).unwrap_err();

    assert!(matches!(err, PipelineError::Agent(AgentError::MissingCredential)));
    assert!(agents.created.borrow().is_empty());
}

#[test]
fn agent_setup_failure_writes_nothing() {
    let (_temp, layout) = layout();
    let keys = KeyStore::new(&layout);
    keys.generate_key().unwrap();
    let settings = SettingsStore::new(&layout, &keys);
    let agents = FakeAgents {
        created: RefCell::new(Vec::new()),
        fail: true,
    };

    let spec = AgentSpec::new("Reader", "v", "m", "p");
    let err = setup_agent(&agents, &settings, "sk-live", &spec).unwrap_err();

    assert!(matches!(err, PipelineError::Agent(AgentError::Creation(_))));
    assert!(!settings.path().exists());
}

#[test]
fn agent_setup_refuses_undecryptable_settings() {
    let (_temp, layout) = layout();
    let keys = KeyStore::new(&layout);
    keys.generate_key().unwrap();
    let settings = SettingsStore::new(&layout, &keys);
    use_existing_agent(&settings, "sk-old", "agent-old").unwrap();

    keys.generate_key().unwrap();
    let agents = FakeAgents::new();
    let spec = AgentSpec::new("Reader", "v", "m", "p");
    let err = setup_agent(&agents, &settings, "sk-live", &spec).unwrap_err();

    assert!(matches!(err, PipelineError::Vault(VaultError::Decryption(_))));
    assert!(agents.created.borrow().is_empty());
}

#[test]
fn existing_agent_is_recorded() {
    let (_temp, layout) = layout();
    let keys = KeyStore::new(&layout);
    keys.generate_key().unwrap();
    let settings = SettingsStore::new(&layout, &keys);

    use_existing_agent(&settings, "sk-live", " agent-42 ").unwrap();
    assert_eq!(settings.load().unwrap().agent_id(), Some("agent-42"));

    let err = use_existing_agent(&settings, "sk-live", "").unwrap_err();
    assert!(matches!(err, PipelineError::Agent(AgentError::MissingAgentId)));
    assert_eq!(settings.load().unwrap().agent_id(), Some("agent-42"));
}

#[test]
fn agent_spec_defaults_language() {
    let spec: AgentSpec = serde_json::from_str(
        r#"{"name":"n","voice_id":"v","llm":"m","system_prompt":"p"}"#,
    )
    .unwrap();
    assert_eq!(spec.language, "en");
    assert_eq!(spec.first_message, None);
}
