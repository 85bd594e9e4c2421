use crate::error::{PipelineError, SpeechError};
use crate::document::store_file;
use narrator_types::voice::find_voice_id;
use narrator_types::{DataLayout, DirectoryRole, VoiceInfo};
use std::path::PathBuf;

/// A text-to-speech service.
///
/// Implementations own the wire protocol; the pipeline only sees voices and
/// audio bytes.
pub trait SpeechBackend {
    /// Voices this backend can render.
    fn list_voices(&self) -> Result<Vec<VoiceInfo>, SpeechError>;

    /// Renders `text` with the voice identified by `voice_id`.
    fn synthesize(&self, text: &str, voice_id: &str) -> Result<Vec<u8>, SpeechError>;
}

impl<T: SpeechBackend + ?Sized> SpeechBackend for &T {
    fn list_voices(&self) -> Result<Vec<VoiceInfo>, SpeechError> {
        (**self).list_voices()
    }

    fn synthesize(&self, text: &str, voice_id: &str) -> Result<Vec<u8>, SpeechError> {
        (**self).synthesize(text, voice_id)
    }
}

/// Turns text into narrated audio files.
#[derive(Debug, Clone)]
pub struct Narrator<S> {
    speech: S,
    audio_dir: PathBuf,
}

impl<S: SpeechBackend> Narrator<S> {
    /// Creates a narrator that saves audio into the layout's `audio/` directory.
    pub fn new(speech: S, layout: &DataLayout) -> Self {
        Self {
            speech,
            audio_dir: layout.dir(DirectoryRole::Audio),
        }
    }

    pub fn voices(&self) -> Result<Vec<VoiceInfo>, SpeechError> {
        self.speech.list_voices()
    }

    /// Resolves a voice name to the backend's voice ID.
    pub fn find_voice(&self, voice_name: &str) -> Result<String, SpeechError> {
        let voices = self.speech.list_voices()?;
        find_voice_id(&voices, voice_name)
            .map(str::to_string)
            .ok_or_else(|| SpeechError::VoiceNotFound(voice_name.to_string()))
    }

    /// Synthesizes `text` with the named voice.
    pub fn narrate(&self, text: &str, voice_name: &str) -> Result<Vec<u8>, PipelineError> {
        if text.trim().is_empty() {
            return Err(SpeechError::EmptyText.into());
        }
        let voice_id = self.find_voice(voice_name)?;
        tracing::info!(voice = voice_name, chars = text.len(), "synthesizing narration");
        Ok(self.speech.synthesize(text, &voice_id)?)
    }

    /// Synthesizes an intro clip followed by `text`, concatenated.
    ///
    /// Both clips use the same voice; the voice list is fetched once.
    pub fn narrate_with_intro(
        &self,
        intro: &str,
        text: &str,
        voice_name: &str,
    ) -> Result<Vec<u8>, PipelineError> {
        if text.trim().is_empty() || intro.trim().is_empty() {
            return Err(SpeechError::EmptyText.into());
        }
        let voice_id = self.find_voice(voice_name)?;

        let mut audio = self.speech.synthesize(intro, &voice_id)?;
        audio.extend(self.speech.synthesize(text, &voice_id)?);
        Ok(audio)
    }

    /// Writes audio into the audio directory under a name not yet taken.
    ///
    /// Returns the path actually written.
    pub fn save_audio(&self, audio: &[u8], file_name: &str) -> Result<PathBuf, PipelineError> {
        let path = store_file(&self.audio_dir, file_name, audio)?;
        tracing::info!(path = %path.display(), bytes = audio.len(), "saved audio");
        Ok(path)
    }
}
