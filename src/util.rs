//! Shared utility functions for bookstore-server

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    use argon2::password_hash::SaltString;
    use argon2::password_hash::rand_core::OsRng;
    use argon2::{Argon2, PasswordHasher};
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    use argon2::{Argon2, PasswordHash, PasswordVerifier};
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Normalize a cover image reference to the `/images/<file>` form served by
/// the static file route. Accepts bare file names, relative paths, and
/// already-normalized paths.
pub fn normalize_image_path(raw: &str) -> String {
    let name = raw.rsplit('/').next().unwrap_or(raw).trim();
    if name.is_empty() {
        "/images/default.jpg".to_string()
    } else {
        format!("/images/{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_roundtrip() {
        let hash = hash_password("hunter2-but-longer").expect("hashing failed");
        assert!(verify_password("hunter2-but-longer", &hash));
        assert!(!verify_password("wrong", &hash));
    }

    #[test]
    fn verify_rejects_garbage_hash() {
        assert!(!verify_password("pw", "not-a-phc-string"));
    }

    #[test]
    fn image_paths_are_normalized() {
        assert_eq!(normalize_image_path("cover.jpg"), "/images/cover.jpg");
        assert_eq!(normalize_image_path("/images/cover.jpg"), "/images/cover.jpg");
        assert_eq!(normalize_image_path("uploads/2024/cover.png"), "/images/cover.png");
        assert_eq!(normalize_image_path(""), "/images/default.jpg");
    }
}
