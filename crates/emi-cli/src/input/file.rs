use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

/// Read a JSON or YAML file (chosen by extension) into a typed struct.
pub fn read_structured<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let contents = fs::read_to_string(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;

    let is_yaml = matches!(
        canonical.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    tracing::debug!(path = %canonical.display(), yaml = is_yaml, "reading quote file");

    let value: T = if is_yaml {
        serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?
    } else {
        serde_json::from_str(&contents)
            .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?
    };
    Ok(value)
}

fn resolve_path(path: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let p = Path::new(path);
    let canonical = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };

    if !canonical.exists() {
        return Err(format!("File not found: {}", canonical.display()).into());
    }
    if !canonical.is_file() {
        return Err(format!("Not a file: {}", canonical.display()).into());
    }

    Ok(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;
    use emi_core::LoanQuote;

    fn write_temp(name: &str, body: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("emi-cli-{}-{}", std::process::id(), name));
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_reads_yaml_quote() {
        let path = write_temp(
            "quote.yaml",
            "principal_requested: 500000\n\
             down_payment: 50000\n\
             annual_interest_rate_percent: 4.5\n\
             tenure_years: 30\n",
        );
        let quote: LoanQuote = read_structured(path.to_str().unwrap()).unwrap();
        assert_eq!(quote.financed_principal(), 450_000.0);
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_reads_json_quote_without_down_payment() {
        let path = write_temp(
            "quote.json",
            r#"{"principal_requested": 20000,
                "annual_interest_rate_percent": 6, "tenure_years": 5}"#,
        );
        let quote: LoanQuote = read_structured(path.to_str().unwrap()).unwrap();
        assert_eq!(quote.down_payment, 0.0);
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_missing_file() {
        let err = read_structured::<LoanQuote>("/definitely/not/here.json").unwrap_err();
        assert!(err.to_string().contains("File not found"));
    }
}
