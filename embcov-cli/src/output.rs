use std::{
    fs,
    path::{Component, Path, PathBuf},
};

use log::info;

/// Where the record of the unit called `name` goes below `out_dir`.
///
/// `strip` is removed from the front of `name` first. Root and `.` components
/// are dropped so absolute build paths land inside `out_dir`; `..` is rejected.
pub fn target_path(
    out_dir: &Path,
    name: &str,
    strip: Option<&str>,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let name = strip
        .and_then(|prefix| name.strip_prefix(prefix))
        .unwrap_or(name);

    let mut path = out_dir.to_path_buf();
    let mut parts = 0;
    for component in Path::new(name).components() {
        match component {
            Component::Normal(part) => {
                path.push(part);
                parts += 1;
            }
            Component::ParentDir => {
                return Err(format!("refusing to write outside of output directory: {}", name).into())
            }
            Component::RootDir | Component::CurDir | Component::Prefix(_) => {}
        }
    }

    if parts == 0 {
        return Err(format!("unit name {:?} has no file name", name).into());
    }
    Ok(path)
}

/// Writes `record` to its [`target_path`], creating directories as needed.
pub fn write_record(
    out_dir: &Path,
    name: &str,
    record: &[u8],
    strip: Option<&str>,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let path = target_path(out_dir, name, strip)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, record)?;
    info!("Wrote {} bytes to {}", record.len(), path.display());
    Ok(path)
}
