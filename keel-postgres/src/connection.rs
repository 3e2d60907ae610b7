use crate::{PostgresDriver, ValueHolder, util::stream_postgres_row_as_keel_row};
use keel_core::{
    Connection, Context, Driver, Error, Executor, Query, Result, RowLabeled, RowsAffected,
    stream::{Stream, TryStreamExt},
    take_url_param,
};
use openssl::ssl::{SslConnector, SslFiletype, SslMethod, SslVerifyMode};
use postgres_openssl::MakeTlsConnector;
use std::{path::Path, sync::Arc};
use tokio::spawn;
use tokio_postgres::NoTls;
use url::Url;
use urlencoding::decode;

pub struct PostgresConnection {
    pub(crate) client: tokio_postgres::Client,
}

impl PostgresConnection {
    fn params(query: &mut Query) -> Vec<ValueHolder> {
        query.params.drain(..).map(ValueHolder).collect()
    }
}

impl Executor for PostgresConnection {
    type Driver = PostgresDriver;

    fn driver(&self) -> &Self::Driver {
        &PostgresDriver {}
    }

    fn fetch(&self, mut query: Query) -> impl Stream<Item = Result<RowLabeled>> + Send {
        let context = Arc::new(format!("While fetching the query:\n{}", query));
        let params = Self::params(&mut query);
        stream_postgres_row_as_keel_row(async move || {
            self.client
                .query_raw(query.sql.as_str(), params)
                .await
                .map_err(Error::new)
        })
        .map_err(move |e: Error| {
            let e = e.context(context.clone());
            log::error!("{:#}", e);
            e
        })
    }

    async fn execute(&self, mut query: Query) -> Result<RowsAffected> {
        let params = Self::params(&mut query);
        let rows_affected = self
            .client
            .execute_raw(query.sql.as_str(), params)
            .await
            .map_err(|e| {
                let e = Error::new(e).context(format!("While executing the query:\n{}", query));
                log::error!("{:#}", e);
                e
            })?;
        Ok(RowsAffected { rows_affected })
    }
}

impl Connection for PostgresConnection {
    async fn connect(url: &str) -> Result<PostgresConnection> {
        let context = || format!("While trying to connect to `{}`", url);
        let url = decode(url).with_context(context)?;
        let prefixes = [
            format!("{}://", <Self::Driver as Driver>::NAME),
            "postgresql://".to_string(),
        ];
        if !prefixes.iter().any(|v| url.starts_with(v.as_str())) {
            let error = Error::msg(format!(
                "Postgres connection url must start with `{}`",
                &prefixes[0]
            ))
            .context(context());
            log::error!("{:#}", error);
            return Err(error);
        }
        let mut url = Url::parse(&url).with_context(context)?;
        let sslmode = take_url_param(&mut url, "sslmode", "PGSSLMODE").unwrap_or("disable".into());
        let client = if sslmode == "disable" {
            let (client, connection) = tokio_postgres::connect(url.as_str(), NoTls)
                .await
                .with_context(context)?;
            spawn(async move {
                if let Err(e) = connection.await
                    && !e.is_closed()
                {
                    log::error!("Postgres connection error: {:#}", e);
                }
            });
            client
        } else {
            let mut builder = SslConnector::builder(SslMethod::tls())?;
            if let Some(path) = take_url_param(&mut url, "sslrootcert", "PGSSLROOTCERT")
                .as_deref()
                .map(Path::new)
                && path.exists()
            {
                builder.set_ca_file(path)?;
            }
            if let Some(path) = take_url_param(&mut url, "sslcert", "PGSSLCERT")
                .as_deref()
                .map(Path::new)
                && path.exists()
            {
                builder.set_certificate_chain_file(path)?;
            }
            if let Some(path) = take_url_param(&mut url, "sslkey", "PGSSLKEY")
                .as_deref()
                .map(Path::new)
                && path.exists()
            {
                builder.set_private_key_file(path, SslFiletype::PEM)?;
            }
            builder.set_verify(match &*sslmode {
                "require" | "prefer" | "allow" => SslVerifyMode::NONE,
                _ => SslVerifyMode::PEER,
            });
            let connector = MakeTlsConnector::new(builder.build());
            let (client, connection) = tokio_postgres::connect(url.as_str(), connector)
                .await
                .with_context(context)?;
            spawn(async move {
                if let Err(e) = connection.await
                    && !e.is_closed()
                {
                    log::error!("Postgres connection error: {:#}", e);
                }
            });
            client
        };
        Ok(Self { client })
    }
}
