use std::{
    fs,
    path::{
        Path,
        PathBuf,
    },
};

use serde::{
    Deserialize,
    Serialize,
};
use tracing::debug;

use crate::core::FiszkiError;

const APP_NAME: &str = "fiszki";

pub fn get_app_data_dir() -> PathBuf {
    if let Some(data_dir) = dirs::data_local_dir() {
        let app_dir = data_dir.join(APP_NAME);
        let _ = fs::create_dir_all(&app_dir);
        app_dir
    } else {
        PathBuf::from(".")
    }
}

pub fn get_data_file_path(filename: &str) -> PathBuf {
    get_app_data_dir().join(filename)
}

pub fn save_json<T: Serialize>(data: &T, file_path: &Path) -> Result<(), FiszkiError> {
    let json = serde_json::to_string_pretty(data)?;
    write_file(file_path, &json)
}

/// Like [`save_json`], but the file write runs on the blocking pool.
pub async fn save_json_async<T: Serialize>(data: &T, file_path: &Path) -> Result<(), FiszkiError> {
    let json = serde_json::to_string_pretty(data)?;
    let file_path = file_path.to_path_buf();
    tokio::task::spawn_blocking(move || write_file(&file_path, &json)).await?
}

fn write_file(file_path: &Path, contents: &str) -> Result<(), FiszkiError> {
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(file_path, contents)?;
    debug!(path = %file_path.display(), "Data saved");
    Ok(())
}

pub fn load_json<T: for<'de> Deserialize<'de> + Default>(
    file_path: &Path,
) -> Result<T, FiszkiError> {
    if !file_path.exists() {
        return Ok(T::default());
    }

    let json = fs::read_to_string(file_path)?;
    let data: T = serde_json::from_str(&json)?;
    debug!(path = %file_path.display(), "Data loaded");
    Ok(data)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn test_round_trip_and_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("data.json");

        let missing: BTreeMap<String, u32> = load_json(&path).unwrap();
        assert!(missing.is_empty());

        let mut data = BTreeMap::new();
        data.insert("pedir".to_string(), 1u32);
        save_json(&data, &path).unwrap();

        let loaded: BTreeMap<String, u32> = load_json(&path).unwrap();
        assert_eq!(loaded, data);
    }

    #[tokio::test]
    async fn test_async_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("async").join("data.json");

        let mut data = BTreeMap::new();
        data.insert("la cuenta".to_string(), 2u32);
        save_json_async(&data, &path).await.unwrap();
        assert_eq!(load_json::<BTreeMap<String, u32>>(&path).unwrap(), data);

        // A directory in the way of the file.
        let err = save_json_async(&data, dir.path()).await.unwrap_err();
        assert!(matches!(err, FiszkiError::Io(_)));
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();

        let err = load_json::<BTreeMap<String, u32>>(&path).unwrap_err();
        assert!(matches!(err, FiszkiError::Json(_)));
    }
}
