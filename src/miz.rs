use crate::error::{Error, Result};
use crate::mission::Mission;
use crate::progress::{NoProgress, Progress};
use crate::sltp::{self, Qualifier};
use crate::value::LuaTable;
use crate::{encoding, statics};
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    fs::{self, File},
    io::{self, BufReader, BufWriter, Read, Write},
    path::{Path, PathBuf},
};
use tempfile::TempDir;
use zip::{CompressionMethod, ZipArchive, ZipWriter, result::ZipError, write::SimpleFileOptions};

// Local file header, or end of central directory for an empty archive.
const ZIP_MAGIC: [&[u8; 4]; 2] = [b"PK\x03\x04", b"PK\x05\x06"];

/// Session settings. Every field has a default, so a config file only lists what it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MizOptions {
    /// Leave the scratch directory on disk after a successful session.
    pub keep_scratch_dir: bool,
    /// Where scratch directories are created; the system temp dir when unset.
    pub scratch_parent: Option<PathBuf>,
    /// Appended to the source file stem to name the default save destination.
    pub output_suffix: String,
    /// Allow `save` to replace an existing file and `unzip` to re-extract.
    pub overwrite: bool,
}

impl Default for MizOptions {
    fn default() -> Self {
        Self {
            keep_scratch_dir: false,
            scratch_parent: None,
            output_suffix: statics::DEFAULT_OUTPUT_SUFFIX.to_string(),
            overwrite: false,
        }
    }
}

impl MizOptions {
    pub fn keep_scratch_dir(mut self, keep: bool) -> Self {
        self.keep_scratch_dir = keep;
        self
    }

    pub fn scratch_parent(mut self, parent: impl Into<PathBuf>) -> Self {
        self.scratch_parent = Some(parent.into());
        self
    }

    pub fn output_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.output_suffix = suffix.into();
        self
    }

    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
}

/// One archive entry, in original order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Entry name exactly as stored in the archive.
    pub name: String,
    /// Location below the scratch directory.
    pub relative: PathBuf,
    pub is_dir: bool,
}

struct Decoded {
    mission: Mission,
    mission_qualifier: Qualifier,
    dictionary_qualifier: Qualifier,
    map_resource: LuaTable,
    map_resource_qualifier: Qualifier,
}

/// A mission archive being edited.
///
/// The archive is extracted into a private scratch directory, its three Lua members are
/// decoded into a [`Mission`], and `save` writes a new archive from the scratch copy. Members
/// this type never decodes are carried over byte for byte.
///
/// ```no_run
/// use mizkit::{Miz, MizOptions};
///
/// # fn main() -> mizkit::Result<()> {
/// let saved = Miz::session("strike.miz", MizOptions::default(), |miz| {
///     let mission = miz.mission().expect("decoded").clone();
///     mission.weather().set_cloud_density(6)?;
///     miz.save(None)
/// })?;
/// println!("written to {}", saved.display());
/// # Ok(())
/// # }
/// ```
pub struct Miz {
    source: PathBuf,
    options: MizOptions,
    scratch: Option<TempDir>,
    manifest: Vec<ManifestEntry>,
    decoded: Option<Decoded>,
    progress: Box<dyn Progress>,
}

impl fmt::Debug for Miz {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Miz")
            .field("source", &self.source)
            .field("options", &self.options)
            .field("scratch", &self.scratch_dir())
            .field("members", &self.manifest.len())
            .field("decoded", &self.decoded.is_some())
            .finish()
    }
}

impl Miz {
    /// An unopened archive handle. Nothing touches the disk until [`Miz::unzip`].
    pub fn new(path: impl AsRef<Path>, options: MizOptions) -> Self {
        Self {
            source: path.as_ref().to_path_buf(),
            options,
            scratch: None,
            manifest: Vec::new(),
            decoded: None,
            progress: Box::new(NoProgress),
        }
    }

    /// Extract and decode in one go. On failure the scratch directory stays on disk and its
    /// location is logged.
    pub fn open(path: impl AsRef<Path>, options: MizOptions) -> Result<Self> {
        let mut miz = Self::new(path, options);
        match miz.unzip().and_then(|()| miz.decode().map(|_| ())) {
            Ok(()) => Ok(miz),
            Err(err) => {
                miz.keep_after_failure(&err);
                Err(err)
            }
        }
    }

    /// Open `path`, run `f`, and release the scratch directory.
    ///
    /// When anything fails the scratch directory stays on disk for inspection, its location
    /// is logged, and the error is returned unchanged.
    pub fn session<T>(
        path: impl AsRef<Path>,
        options: MizOptions,
        f: impl FnOnce(&mut Miz) -> Result<T>,
    ) -> Result<T> {
        Self::new(path, options).run(f)
    }

    /// [`Miz::session`] for a handle configured beforehand, e.g. with a progress sink.
    pub fn run<T>(mut self, f: impl FnOnce(&mut Miz) -> Result<T>) -> Result<T> {
        let outcome = self.unzip().and_then(|()| self.decode().map(|_| ()));
        match outcome.and_then(|()| f(&mut self)) {
            Ok(value) => {
                self.close()?;
                Ok(value)
            }
            Err(err) => {
                self.keep_after_failure(&err);
                Err(err)
            }
        }
    }

    pub fn with_progress(mut self, progress: Box<dyn Progress>) -> Self {
        self.progress = progress;
        self
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn options(&self) -> &MizOptions {
        &self.options
    }

    pub fn manifest(&self) -> &[ManifestEntry] {
        &self.manifest
    }

    pub fn scratch_dir(&self) -> Option<&Path> {
        self.scratch.as_ref().map(TempDir::path)
    }

    pub fn mission(&self) -> Option<&Mission> {
        self.decoded.as_ref().map(|d| &d.mission)
    }

    pub fn map_resource(&self) -> Option<&LuaTable> {
        self.decoded.as_ref().map(|d| &d.map_resource)
    }

    pub fn map_resource_mut(&mut self) -> Option<&mut LuaTable> {
        self.decoded.as_mut().map(|d| &mut d.map_resource)
    }

    /// Extract every member into a fresh scratch directory and check the required ones landed.
    pub fn unzip(&mut self) -> Result<()> {
        if self.scratch.is_some() {
            if !self.options.overwrite {
                return Err(Error::Usage("archive already extracted"));
            }
            self.decoded = None;
            self.manifest.clear();
        }
        let path = self.source.clone();
        check_container(&path)?;

        let file = File::open(&path).map_err(|e| Error::io(&path, e))?;
        let mut archive = ZipArchive::new(BufReader::new(file)).map_err(|source| Error::CorruptArchive {
            path: path.clone(),
            source,
        })?;

        let mut builder = tempfile::Builder::new();
        builder.prefix(statics::SCRATCH_PREFIX);
        let parent = self
            .options
            .scratch_parent
            .clone()
            .unwrap_or_else(std::env::temp_dir);
        let scratch = builder.tempdir_in(&parent).map_err(|e| Error::io(&parent, e))?;
        let root = scratch.path().to_path_buf();
        self.scratch = Some(scratch);
        tracing::debug!(op = "unzip", path = %path.display(), scratch = %root.display(), entries = archive.len(), "extracting");

        for i in 0..archive.len() {
            let mut entry = archive.by_index(i).map_err(|source| Error::CorruptArchive {
                path: path.clone(),
                source,
            })?;
            let name = entry.name().to_string();
            let relative = entry.enclosed_name().ok_or_else(|| Error::CorruptArchive {
                path: path.clone(),
                source: ZipError::InvalidArchive("unsafe entry name".into()),
            })?;
            let target = root.join(&relative);
            if entry.is_dir() {
                fs::create_dir_all(&target).map_err(|e| Error::io(&target, e))?;
            } else {
                if let Some(dir) = target.parent() {
                    fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
                }
                let mut out = File::create(&target).map_err(|e| Error::io(&target, e))?;
                io::copy(&mut entry, &mut out).map_err(|e| Error::io(&target, e))?;
            }
            self.manifest.push(ManifestEntry {
                is_dir: entry.is_dir(),
                name,
                relative,
            });
        }

        for member in statics::REQUIRED_MEMBERS {
            if !root.join(member).is_file() {
                return Err(Error::MissingMember {
                    path: PathBuf::from(member),
                });
            }
        }
        if let Some(missing) = self
            .manifest
            .iter()
            .find(|entry| !root.join(&entry.relative).exists())
        {
            return Err(Error::MissingMember {
                path: missing.relative.clone(),
            });
        }
        tracing::info!(op = "unzip", path = %path.display(), members = self.manifest.len(), "archive extracted");
        Ok(())
    }

    /// Decode the map resource, dictionary and mission members.
    pub fn decode(&mut self) -> Result<&Mission> {
        if self.decoded.is_some() {
            return Err(Error::Usage("archive already decoded"));
        }
        let root = self
            .scratch_dir()
            .ok_or(Error::Usage("archive not extracted"))?
            .to_path_buf();

        self.progress.start(statics::EN_PROGRESS_DECODE, 3);
        self.progress.label(statics::EN_LABEL_MAP_RESOURCE);
        let (map_resource, map_resource_qualifier) = read_member(&root, statics::MEMBER_MAP_RESOURCE)?;
        self.progress.advance(1);
        self.progress.label(statics::EN_LABEL_DICTIONARY);
        let (dictionary, dictionary_qualifier) = read_member(&root, statics::MEMBER_DICTIONARY)?;
        self.progress.advance(2);
        self.progress.label(statics::EN_LABEL_MISSION);
        let (mission, mission_qualifier) = read_member(&root, statics::MEMBER_MISSION)?;
        self.progress.advance(3);
        self.progress.done();

        let decoded = self.decoded.insert(Decoded {
            mission: Mission::from_tables(mission, dictionary),
            mission_qualifier,
            dictionary_qualifier,
            map_resource,
            map_resource_qualifier,
        });
        tracing::info!(op = "decode", path = %self.source.display(), "mission decoded");
        Ok(&decoded.mission)
    }

    /// Write the three decoded members back into the scratch directory.
    pub fn encode(&mut self) -> Result<()> {
        let decoded = self
            .decoded
            .as_ref()
            .ok_or(Error::Usage("archive not decoded"))?;
        let root = self
            .scratch
            .as_ref()
            .map(|s| s.path().to_path_buf())
            .ok_or(Error::Usage("archive not extracted"))?;

        self.progress.start(statics::EN_PROGRESS_ENCODE, 3);
        self.progress.label(statics::EN_LABEL_MAP_RESOURCE);
        write_member(
            &root,
            statics::MEMBER_MAP_RESOURCE,
            &decoded.map_resource,
            &decoded.map_resource_qualifier,
        )?;
        self.progress.advance(1);
        self.progress.label(statics::EN_LABEL_DICTIONARY);
        decoded.mission.with_tables(|_, dictionary| {
            write_member(&root, statics::MEMBER_DICTIONARY, dictionary, &decoded.dictionary_qualifier)
        })?;
        self.progress.advance(2);
        self.progress.label(statics::EN_LABEL_MISSION);
        decoded.mission.with_tables(|mission, _| {
            write_member(&root, statics::MEMBER_MISSION, mission, &decoded.mission_qualifier)
        })?;
        self.progress.advance(3);
        self.progress.done();
        Ok(())
    }

    /// Sibling of the source named `<stem><suffix>.miz`.
    pub fn default_destination(&self) -> PathBuf {
        let stem = self
            .source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.source.with_file_name(format!(
            "{stem}{}.{}",
            self.options.output_suffix,
            statics::MIZ_EXTENSION
        ))
    }

    /// Encode, then write a new archive holding exactly the original members in their
    /// original order. Returns the path written.
    pub fn save(&mut self, destination: Option<&Path>) -> Result<PathBuf> {
        let dest = destination
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.default_destination());
        if dest.exists() && !self.options.overwrite {
            return Err(Error::DestinationExists { path: dest });
        }
        self.encode()?;
        let root = self
            .scratch_dir()
            .ok_or(Error::Usage("archive not extracted"))?;

        let file = File::create(&dest).map_err(|e| Error::io(&dest, e))?;
        let mut zip = ZipWriter::new(BufWriter::new(file));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        for entry in &self.manifest {
            if entry.is_dir {
                zip.add_directory(entry.name.as_str(), options)
                    .map_err(|e| zip_error(&dest, e))?;
                continue;
            }
            zip.start_file(entry.name.as_str(), options)
                .map_err(|e| zip_error(&dest, e))?;
            let source = root.join(&entry.relative);
            let mut member = File::open(&source).map_err(|e| Error::io(&source, e))?;
            let mut bytes = Vec::new();
            member
                .read_to_end(&mut bytes)
                .map_err(|e| Error::io(&source, e))?;
            zip.write_all(&bytes).map_err(|e| Error::io(&dest, e))?;
        }
        let mut out = zip.finish().map_err(|e| zip_error(&dest, e))?;
        out.flush().map_err(|e| Error::io(&dest, e))?;
        tracing::info!(op = "save", path = %dest.display(), members = self.manifest.len(), "archive written");
        Ok(dest)
    }

    /// Release the scratch directory, or keep it when `keep_scratch_dir` is set.
    /// Returns the kept directory, if any.
    pub fn close(mut self) -> Result<Option<PathBuf>> {
        if self.options.keep_scratch_dir {
            let kept = self.retain_scratch();
            if let Some(dir) = &kept {
                tracing::info!(scratch = %dir.display(), "scratch directory kept");
            }
            return Ok(kept);
        }
        if let Some(scratch) = self.scratch.take() {
            let dir = scratch.path().to_path_buf();
            scratch.close().map_err(|e| Error::io(dir, e))?;
        }
        Ok(None)
    }

    fn retain_scratch(&mut self) -> Option<PathBuf> {
        self.scratch.take().map(TempDir::keep)
    }

    fn keep_after_failure(&mut self, err: &Error) {
        if let Some(dir) = self.retain_scratch() {
            tracing::error!(path = %self.source.display(), scratch = %dir.display(), error = %err, "failed, scratch directory kept");
        }
    }
}

/// Existence, extension and magic-number checks before the zip reader sees the file.
fn check_container(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(Error::NotFound {
            path: path.to_path_buf(),
        });
    }
    let subject = path.display().to_string();
    if !path.is_file() {
        return Err(Error::type_mismatch(subject, "file", "directory"));
    }
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    if extension != statics::MIZ_EXTENSION {
        return Err(Error::type_mismatch(
            subject,
            format!(".{} archive", statics::MIZ_EXTENSION),
            format!("extension {extension:?}"),
        ));
    }
    let mut magic = [0_u8; 4];
    let mut file = File::open(path).map_err(|e| Error::io(path, e))?;
    let read = file.read(&mut magic).map_err(|e| Error::io(path, e))?;
    if read < magic.len() || !ZIP_MAGIC.contains(&&magic) {
        return Err(Error::type_mismatch(subject, "zip archive", "unrecognized content"));
    }
    Ok(())
}

fn read_member(root: &Path, member: &str) -> Result<(LuaTable, Qualifier)> {
    let path = root.join(member);
    let bytes = fs::read(&path).map_err(|e| Error::io(&path, e))?;
    tracing::debug!(op = "decode", member, bytes = bytes.len(), "decoding member");
    let text = encoding::decode(&bytes);
    sltp::decode(&text).map_err(|source| Error::Parse {
        member: member.to_string(),
        source,
    })
}

fn write_member(root: &Path, member: &str, tree: &LuaTable, qualifier: &Qualifier) -> Result<()> {
    let text = sltp::encode(tree, qualifier).map_err(|e| Error::Encode {
        member: member.to_string(),
        reason: e.to_string(),
    })?;
    let bytes = encoding::encode(&text).map_err(|c| Error::Encode {
        member: member.to_string(),
        reason: format!("{c:?} cannot be written in the Windows-1252 code page"),
    })?;
    let path = root.join(member);
    fs::write(&path, &bytes).map_err(|e| Error::io(&path, e))?;
    tracing::debug!(op = "encode", member, bytes = bytes.len(), "member written");
    Ok(())
}

fn zip_error(path: &Path, err: ZipError) -> Error {
    match err {
        ZipError::Io(source) => Error::io(path, source),
        source => Error::CorruptArchive {
            path: path.to_path_buf(),
            source,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::{MizOptions, check_container};
    use crate::error::Error;
    use std::fs;

    #[test]
    fn options_default_and_builders() {
        let options = MizOptions::default();
        assert_eq!(options.output_suffix, "_edited");
        assert!(!options.overwrite);

        let options = options.keep_scratch_dir(true).output_suffix("_v2").overwrite(true);
        assert!(options.keep_scratch_dir);
        assert_eq!(options.output_suffix, "_v2");
    }

    #[test]
    fn options_from_partial_toml() {
        let options: MizOptions = toml::from_str("overwrite = true\n").unwrap();
        assert!(options.overwrite);
        assert_eq!(options.output_suffix, "_edited");
        assert_eq!(options.scratch_parent, None);
    }

    #[test]
    fn container_check_uses_extension_and_magic() {
        let dir = tempfile::tempdir().unwrap();

        let missing = dir.path().join("absent.miz");
        assert!(matches!(check_container(&missing), Err(Error::NotFound { .. })));

        let wrong_ext = dir.path().join("mission.zip");
        fs::write(&wrong_ext, b"PK\x03\x04rest").unwrap();
        assert!(matches!(check_container(&wrong_ext), Err(Error::TypeMismatch { .. })));

        let not_zip = dir.path().join("mission.miz");
        fs::write(&not_zip, b"mission = {}").unwrap();
        assert!(matches!(check_container(&not_zip), Err(Error::TypeMismatch { .. })));

        let ok = dir.path().join("ok.miz");
        fs::write(&ok, b"PK\x03\x04rest").unwrap();
        assert!(check_container(&ok).is_ok());

        assert!(matches!(check_container(dir.path()), Err(Error::TypeMismatch { .. })));
    }
}
