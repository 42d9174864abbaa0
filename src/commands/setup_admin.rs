//! Register the default admin account with the auth provider

use anyhow::{Context, Result};

use crate::backend::{AuthUser, BackendError, Credentials};
use crate::Blog;

pub const DEFAULT_ADMIN_EMAIL: &str = "admin@merncryptoblog.com";
pub const DEFAULT_ADMIN_PASSWORD: &str = "Admin123!";

/// What happened when registering the admin
#[derive(Debug, Clone, PartialEq)]
pub enum SetupOutcome {
    Created(AuthUser),
    AlreadyRegistered,
}

/// Sign up the admin account, treating "already registered" as success
pub async fn setup(blog: &Blog, credentials: &Credentials) -> Result<SetupOutcome> {
    match blog.store.sign_up(credentials).await {
        Ok(user) => Ok(SetupOutcome::Created(user)),
        Err(BackendError::Api { message, .. }) if message.contains("already registered") => {
            Ok(SetupOutcome::AlreadyRegistered)
        }
        Err(e) => Err(e).context("failed to create the admin account"),
    }
}

/// Run the setup and print follow-up instructions
pub async fn run(blog: &Blog, email: &str, password: &str) -> Result<()> {
    if !blog.store.is_configured() {
        anyhow::bail!(
            "Supabase credentials not found. Set SUPABASE_URL and SUPABASE_ANON_KEY (or the VITE_ variants) in .env"
        );
    }

    println!("Setting up admin user...");
    let credentials = Credentials {
        email: email.to_string(),
        password: password.to_string(),
    };

    match setup(blog, &credentials).await? {
        SetupOutcome::Created(user) => {
            println!("Admin user created successfully!");
            println!("User ID: {}", user.id);
            if user.email_confirmed_at.is_none() {
                println!("Email confirmation required. Either:");
                println!("  1. Follow the confirmation link sent to {}, or", email);
                println!("  2. Open the Supabase dashboard > Authentication > Users and confirm the user");
            }
        }
        SetupOutcome::AlreadyRegistered => {
            println!("Admin user already exists.");
            println!("If sign-in fails, confirm {} in the Supabase dashboard:", email);
            println!("  Authentication > Users > select the user > Confirm User");
        }
    }

    println!();
    println!("Admin credentials:");
    println!("  Email:    {}", email);
    println!("  Password: {}", password);
    println!(
        "Login at: http://{}:{}/login",
        blog.config.host, blog.config.port
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> Credentials {
        Credentials {
            email: DEFAULT_ADMIN_EMAIL.to_string(),
            password: DEFAULT_ADMIN_PASSWORD.to_string(),
        }
    }

    #[tokio::test]
    async fn test_setup_is_idempotent() {
        let blog = Blog::in_memory(".").unwrap();
        let first = setup(&blog, &admin()).await.unwrap();
        assert!(matches!(first, SetupOutcome::Created(_)));

        let second = setup(&blog, &admin()).await.unwrap();
        assert_eq!(second, SetupOutcome::AlreadyRegistered);
    }

    #[tokio::test]
    async fn test_run_requires_configured_backend() {
        let blog = Blog::with_backend(
            ".",
            crate::config::SiteConfig::default(),
            std::sync::Arc::new(crate::backend::NullBackend),
        );
        let err = run(&blog, DEFAULT_ADMIN_EMAIL, DEFAULT_ADMIN_PASSWORD)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("credentials not found"));
    }
}
