use rand::Rng;
use rodio::decoder::DecoderError;
use rodio::{Decoder, Source};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Fewest clips the library accepts
pub const MIN_CLIPS: usize = 2;

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("failed to read audio directory {}", .path.display())]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no usable audio files found in {}", .0.display())]
    NoClips(PathBuf),

    #[error("need at least {} audio files, found {found} in {}", MIN_CLIPS, .path.display())]
    TooFewClips { path: PathBuf, found: usize },
}

#[derive(Debug, Error)]
pub enum ClipError {
    #[error("failed to open {}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: DecoderError,
    },

    #[error("{} contains no audio", .0.display())]
    Silent(PathBuf),
}

/// A decoded audio clip held in memory
#[derive(Debug, Clone)]
pub struct Clip {
    path: PathBuf,
    sample_rate: u32,
    channels: u16,
    samples: Arc<[i16]>,
}

impl Clip {
    /// Decode a whole file into interleaved samples
    pub fn decode<P: AsRef<Path>>(path: P) -> Result<Self, ClipError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ClipError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let decoder = Decoder::new(BufReader::new(file)).map_err(|source| ClipError::Decode {
            path: path.to_path_buf(),
            source,
        })?;

        let sample_rate = decoder.sample_rate();
        let channels = decoder.channels();
        let samples: Vec<i16> = decoder.collect();
        if samples.is_empty() {
            return Err(ClipError::Silent(path.to_path_buf()));
        }

        Ok(Self::from_samples(path, sample_rate, channels, samples))
    }

    /// Wrap samples that are already decoded
    pub fn from_samples<P: Into<PathBuf>>(
        path: P,
        sample_rate: u32,
        channels: u16,
        samples: Vec<i16>,
    ) -> Self {
        Self {
            path: path.into(),
            sample_rate,
            channels,
            samples: samples.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn duration(&self) -> Duration {
        playing_time(self.samples.len(), self.channels, self.sample_rate)
    }

    /// A stream positioned at the first sample
    pub fn stream(&self) -> ClipStream {
        ClipStream {
            samples: Arc::clone(&self.samples),
            position: 0,
            sample_rate: self.sample_rate,
            channels: self.channels,
        }
    }
}

/// Seekable reader over a clip's samples
#[derive(Debug, Clone)]
pub struct ClipStream {
    samples: Arc<[i16]>,
    position: usize,
    sample_rate: u32,
    channels: u16,
}

impl ClipStream {
    pub fn position(&self) -> usize {
        self.position
    }

    /// Move back to the first sample
    pub fn rewind(&mut self) {
        self.position = 0;
    }
}

impl Iterator for ClipStream {
    type Item = i16;

    fn next(&mut self) -> Option<i16> {
        let sample = self.samples.get(self.position).copied()?;
        self.position += 1;
        Some(sample)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.samples.len() - self.position;
        (left, Some(left))
    }
}

impl Source for ClipStream {
    fn current_frame_len(&self) -> Option<usize> {
        Some(self.samples.len() - self.position)
    }

    fn channels(&self) -> u16 {
        self.channels
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        Some(playing_time(self.samples.len(), self.channels, self.sample_rate))
    }
}

fn playing_time(samples: usize, channels: u16, sample_rate: u32) -> Duration {
    let frames = samples as u64 / channels.max(1) as u64;
    Duration::from_secs_f64(frames as f64 / sample_rate.max(1) as f64)
}

/// The set of clips playback picks from; fixed after loading
#[derive(Debug)]
pub struct AudioLibrary {
    clips: Vec<Clip>,
}

impl AudioLibrary {
    /// Decode every file in `dir` whose extension matches one of `extensions`
    ///
    /// Extensions compare case-insensitively and may be given with or without
    /// the leading dot. Files that fail to decode are skipped with a warning.
    pub fn load<P: AsRef<Path>>(dir: P, extensions: &[String]) -> Result<Self, LibraryError> {
        let dir = dir.as_ref();
        let wanted: Vec<String> = extensions
            .iter()
            .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
            .collect();

        let entries = std::fs::read_dir(dir).map_err(|source| LibraryError::Directory {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .and_then(|e| e.to_str())
                    .map(|e| wanted.contains(&e.to_ascii_lowercase()))
                    .unwrap_or(false)
            })
            .collect();
        paths.sort();

        tracing::info!("Found {} audio files in {}", paths.len(), dir.display());

        let mut clips = Vec::with_capacity(paths.len());
        for path in &paths {
            match Clip::decode(path) {
                Ok(clip) => {
                    tracing::debug!(
                        "Loaded {} ({} Hz, {} ch, {:.1}s)",
                        path.display(),
                        clip.sample_rate(),
                        clip.channels(),
                        clip.duration().as_secs_f32()
                    );
                    clips.push(clip);
                }
                Err(e) => tracing::warn!("Skipping audio file: {:#}", anyhow::Error::new(e)),
            }
        }

        Self::from_clips(dir, clips)
    }

    /// Build a library from clips already in memory
    pub fn from_clips<P: AsRef<Path>>(origin: P, clips: Vec<Clip>) -> Result<Self, LibraryError> {
        match clips.len() {
            0 => Err(LibraryError::NoClips(origin.as_ref().to_path_buf())),
            n if n < MIN_CLIPS => Err(LibraryError::TooFewClips {
                path: origin.as_ref().to_path_buf(),
                found: n,
            }),
            _ => Ok(Self { clips }),
        }
    }

    pub fn clips(&self) -> &[Clip] {
        &self.clips
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    /// Pick a clip uniformly at random
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> &Clip {
        &self.clips[rng.gen_range(0..self.clips.len())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::fixtures::{tone, write_wav};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn exts(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn loads_matching_files_case_insensitively() {
        let dir = tempfile::tempdir().unwrap();
        write_wav(&dir.path().join("a.wav"), 8000, &tone(800, 3));
        write_wav(&dir.path().join("B.WAV"), 8000, &tone(400, 5));
        write_wav(&dir.path().join("c.txt"), 8000, &tone(400, 5));
        std::fs::create_dir(dir.path().join("nested.wav")).unwrap();

        let library = AudioLibrary::load(dir.path(), &exts(&[".Wav"])).unwrap();
        assert_eq!(library.len(), 2);

        let clip = &library.clips()[0];
        assert_eq!(clip.sample_rate(), 8000);
        assert_eq!(clip.channels(), 1);
        assert_eq!(clip.duration().as_millis(), 50);
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = AudioLibrary::load(dir.path().join("nope"), &exts(&["mp3"])).unwrap_err();
        assert!(matches!(err, LibraryError::Directory { .. }));
    }

    #[test]
    fn empty_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = AudioLibrary::load(dir.path(), &exts(&["mp3"])).unwrap_err();
        assert!(matches!(err, LibraryError::NoClips(_)));
    }

    #[test]
    fn single_clip_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write_wav(&dir.path().join("only.wav"), 8000, &tone(100, 7));

        let err = AudioLibrary::load(dir.path(), &exts(&["wav"])).unwrap_err();
        assert!(matches!(err, LibraryError::TooFewClips { found: 1, .. }));
    }

    #[test]
    fn undecodable_files_do_not_count() {
        let dir = tempfile::tempdir().unwrap();
        write_wav(&dir.path().join("good.wav"), 8000, &tone(100, 7));
        std::fs::write(dir.path().join("bad.wav"), b"garbage").unwrap();

        let err = AudioLibrary::load(dir.path(), &exts(&["wav"])).unwrap_err();
        assert!(matches!(err, LibraryError::TooFewClips { found: 1, .. }));
    }

    #[test]
    fn rewound_stream_replays_identical_samples() {
        let dir = tempfile::tempdir().unwrap();
        let samples = tone(500, 11);
        write_wav(&dir.path().join("clip.wav"), 16000, &samples);
        let clip = Clip::decode(dir.path().join("clip.wav")).unwrap();

        let mut stream = clip.stream();
        let first: Vec<i16> = stream.by_ref().collect();
        assert_eq!(first, samples);
        assert_eq!(stream.position(), samples.len());

        stream.rewind();
        let second: Vec<i16> = stream.collect();
        assert_eq!(first, second);

        let fresh: Vec<i16> = clip.stream().collect();
        assert_eq!(first, fresh);
    }

    #[test]
    fn choose_covers_every_clip() {
        let clips = (0..3)
            .map(|i| Clip::from_samples(format!("{i}.wav"), 8000, 1, vec![i as i16; 10]))
            .collect();
        let library = AudioLibrary::from_clips("mem", clips).unwrap();
        let mut rng = StdRng::seed_from_u64(7);

        let mut seen = [0usize; 3];
        for _ in 0..300 {
            let clip = library.choose(&mut rng);
            seen[clip.stream().next().unwrap() as usize] += 1;
        }
        assert!(seen.iter().all(|&n| n > 50));
    }
}
