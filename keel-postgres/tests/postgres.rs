
#[cfg(test)]
mod tests {
    use super::init::init;
    use keel_core::{Connection, Connector};
    use keel_postgres::PostgresConnection;
    use keel_tests::{execute_tests, init_logs, silent_logs};
    use std::sync::Mutex;

    static MUTEX: Mutex<()> = Mutex::new(());

    #[tokio::test]
    async fn postgres() {
        init_logs();
        let _guard = MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        let Some((url, container)) = init().await else {
            return;
        };
        let connector = Connector::<PostgresConnection>::from_url(&format!(
            "{url}{}secret=test-secret",
            if url.contains('?') { '&' } else { '?' }
        ))
        .expect("Could not read the url");
        execute_tests(connector).await;
        drop(container);
    }

    #[tokio::test]
    async fn deterministic_encryption() {
        init_logs();
        let _guard = MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        let Some((url, container)) = init().await else {
            return;
        };
        let separator = if url.contains('?') { '&' } else { '?' };
        let connector = Connector::<PostgresConnection>::from_url(&format!(
            "{url}{separator}secret=test-secret&disable_salts=true"
        ))
        .expect("Could not read the url");
        assert!(connector.config().disable_salts);
        execute_tests(connector).await;
        drop(container);
    }

    #[tokio::test]
    async fn wrong_url() {
        silent_logs! {
            assert!(PostgresConnection::connect("mysql://some_url").await.is_err());
        }
    }
}
