//! Repository contracts and their SQLite implementations.
//!
//! Every repository is a trait so use cases can be exercised against
//! in-memory doubles. Absence is an explicit `Ok(None)`, never an error.

use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::schema::{
    AssociatedFigmaDesign, AssociatedFigmaDesignCreateParams, ConnectInstallation,
    ConnectInstallationCreateParams, ConnectUserInfo, FigmaOAuth2UserCredentials,
    FigmaOAuth2UserCredentialsCreateParams, FigmaTeam, FigmaTeamAuthStatus,
    FigmaTeamCreateParams,
};
use super::DbError;

#[async_trait]
pub trait ConnectInstallationRepository: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<ConnectInstallation>, DbError>;

    async fn get_by_client_key(
        &self,
        client_key: &str,
    ) -> Result<Option<ConnectInstallation>, DbError>;

    async fn upsert(
        &self,
        params: ConnectInstallationCreateParams,
    ) -> Result<ConnectInstallation, DbError>;

    /// Deletes the installation; dependent rows are removed by cascade.
    async fn delete_by_client_key(&self, client_key: &str) -> Result<(), DbError>;
}

#[async_trait]
pub trait FigmaOAuth2UserCredentialsRepository: Send + Sync {
    async fn get(
        &self,
        user: &ConnectUserInfo,
    ) -> Result<Option<FigmaOAuth2UserCredentials>, DbError>;

    /// Fully replaces any prior credentials for the same user/installation pair.
    async fn upsert(
        &self,
        params: FigmaOAuth2UserCredentialsCreateParams,
    ) -> Result<FigmaOAuth2UserCredentials, DbError>;
}

#[async_trait]
pub trait FigmaTeamRepository: Send + Sync {
    async fn get_by_webhook_id(&self, webhook_id: &str) -> Result<Option<FigmaTeam>, DbError>;

    async fn get_by_team_id_and_installation_id(
        &self,
        team_id: &str,
        connect_installation_id: &str,
    ) -> Result<Option<FigmaTeam>, DbError>;

    async fn upsert(&self, params: FigmaTeamCreateParams) -> Result<FigmaTeam, DbError>;

    async fn update_auth_status(
        &self,
        id: &str,
        auth_status: FigmaTeamAuthStatus,
    ) -> Result<(), DbError>;

    async fn delete(&self, id: &str) -> Result<(), DbError>;

    async fn find_many_by_installation_id(
        &self,
        connect_installation_id: &str,
    ) -> Result<Vec<FigmaTeam>, DbError>;
}

#[async_trait]
pub trait AssociatedFigmaDesignRepository: Send + Sync {
    async fn upsert(
        &self,
        params: AssociatedFigmaDesignCreateParams,
    ) -> Result<AssociatedFigmaDesign, DbError>;

    async fn delete(&self, params: AssociatedFigmaDesignCreateParams) -> Result<(), DbError>;

    /// All associations recorded for a file within one installation.
    async fn find_many_by_file_key_and_installation_id(
        &self,
        file_key: &str,
        connect_installation_id: &str,
    ) -> Result<Vec<AssociatedFigmaDesign>, DbError>;
}

pub struct SqliteConnectInstallationRepository {
    pool: SqlitePool,
}

impl SqliteConnectInstallationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConnectInstallationRepository for SqliteConnectInstallationRepository {
    async fn get(&self, id: &str) -> Result<Option<ConnectInstallation>, DbError> {
        let row: Option<ConnectInstallation> = sqlx::query_as(
            "SELECT id, key, client_key, shared_secret, base_url, display_url
             FROM connect_installations WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn get_by_client_key(
        &self,
        client_key: &str,
    ) -> Result<Option<ConnectInstallation>, DbError> {
        let row: Option<ConnectInstallation> = sqlx::query_as(
            "SELECT id, key, client_key, shared_secret, base_url, display_url
             FROM connect_installations WHERE client_key = ?",
        )
        .bind(client_key)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn upsert(
        &self,
        params: ConnectInstallationCreateParams,
    ) -> Result<ConnectInstallation, DbError> {
        let id = Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO connect_installations (id, key, client_key, shared_secret, base_url, display_url)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(client_key) DO UPDATE SET
                 key = excluded.key,
                 shared_secret = excluded.shared_secret,
                 base_url = excluded.base_url,
                 display_url = excluded.display_url",
        )
        .bind(&id)
        .bind(&params.key)
        .bind(&params.client_key)
        .bind(&params.shared_secret)
        .bind(&params.base_url)
        .bind(&params.display_url)
        .execute(&self.pool)
        .await?;

        self.get_by_client_key(&params.client_key)
            .await?
            .ok_or(DbError::Sqlx(sqlx::Error::RowNotFound))
    }

    async fn delete_by_client_key(&self, client_key: &str) -> Result<(), DbError> {
        sqlx::query("DELETE FROM connect_installations WHERE client_key = ?")
            .bind(client_key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

pub struct SqliteFigmaOAuth2UserCredentialsRepository {
    pool: SqlitePool,
}

impl SqliteFigmaOAuth2UserCredentialsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FigmaOAuth2UserCredentialsRepository for SqliteFigmaOAuth2UserCredentialsRepository {
    async fn get(
        &self,
        user: &ConnectUserInfo,
    ) -> Result<Option<FigmaOAuth2UserCredentials>, DbError> {
        let row: Option<FigmaOAuth2UserCredentials> = sqlx::query_as(
            "SELECT id, atlassian_user_id, connect_installation_id, access_token, refresh_token, expires_at
             FROM figma_oauth2_user_credentials
             WHERE atlassian_user_id = ? AND connect_installation_id = ?",
        )
        .bind(&user.atlassian_user_id)
        .bind(&user.connect_installation_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn upsert(
        &self,
        params: FigmaOAuth2UserCredentialsCreateParams,
    ) -> Result<FigmaOAuth2UserCredentials, DbError> {
        let id = Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO figma_oauth2_user_credentials
                 (id, atlassian_user_id, connect_installation_id, access_token, refresh_token, expires_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(atlassian_user_id, connect_installation_id) DO UPDATE SET
                 access_token = excluded.access_token,
                 refresh_token = excluded.refresh_token,
                 expires_at = excluded.expires_at",
        )
        .bind(&id)
        .bind(&params.atlassian_user_id)
        .bind(&params.connect_installation_id)
        .bind(&params.access_token)
        .bind(&params.refresh_token)
        .bind(params.expires_at)
        .execute(&self.pool)
        .await?;

        let user = ConnectUserInfo {
            atlassian_user_id: params.atlassian_user_id,
            connect_installation_id: params.connect_installation_id,
        };
        self.get(&user)
            .await?
            .ok_or(DbError::Sqlx(sqlx::Error::RowNotFound))
    }
}

pub struct SqliteFigmaTeamRepository {
    pool: SqlitePool,
}

impl SqliteFigmaTeamRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

const FIGMA_TEAM_COLUMNS: &str = "id, team_id, team_name, webhook_id, webhook_passcode, \
     figma_admin_atlassian_user_id, auth_status, connect_installation_id";

#[async_trait]
impl FigmaTeamRepository for SqliteFigmaTeamRepository {
    async fn get_by_webhook_id(&self, webhook_id: &str) -> Result<Option<FigmaTeam>, DbError> {
        let row: Option<FigmaTeam> = sqlx::query_as(&format!(
            "SELECT {FIGMA_TEAM_COLUMNS} FROM figma_teams WHERE webhook_id = ?"
        ))
        .bind(webhook_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn get_by_team_id_and_installation_id(
        &self,
        team_id: &str,
        connect_installation_id: &str,
    ) -> Result<Option<FigmaTeam>, DbError> {
        let row: Option<FigmaTeam> = sqlx::query_as(&format!(
            "SELECT {FIGMA_TEAM_COLUMNS} FROM figma_teams
             WHERE team_id = ? AND connect_installation_id = ?"
        ))
        .bind(team_id)
        .bind(connect_installation_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn upsert(&self, params: FigmaTeamCreateParams) -> Result<FigmaTeam, DbError> {
        let id = Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO figma_teams
                 (id, team_id, team_name, webhook_id, webhook_passcode,
                  figma_admin_atlassian_user_id, auth_status, connect_installation_id)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(team_id, connect_installation_id) DO UPDATE SET
                 team_name = excluded.team_name,
                 webhook_id = excluded.webhook_id,
                 webhook_passcode = excluded.webhook_passcode,
                 figma_admin_atlassian_user_id = excluded.figma_admin_atlassian_user_id,
                 auth_status = excluded.auth_status",
        )
        .bind(&id)
        .bind(&params.team_id)
        .bind(&params.team_name)
        .bind(&params.webhook_id)
        .bind(&params.webhook_passcode)
        .bind(&params.figma_admin_atlassian_user_id)
        .bind(params.auth_status)
        .bind(&params.connect_installation_id)
        .execute(&self.pool)
        .await?;

        self.get_by_team_id_and_installation_id(&params.team_id, &params.connect_installation_id)
            .await?
            .ok_or(DbError::Sqlx(sqlx::Error::RowNotFound))
    }

    async fn update_auth_status(
        &self,
        id: &str,
        auth_status: FigmaTeamAuthStatus,
    ) -> Result<(), DbError> {
        sqlx::query("UPDATE figma_teams SET auth_status = ? WHERE id = ?")
            .bind(auth_status)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), DbError> {
        sqlx::query("DELETE FROM figma_teams WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn find_many_by_installation_id(
        &self,
        connect_installation_id: &str,
    ) -> Result<Vec<FigmaTeam>, DbError> {
        let rows: Vec<FigmaTeam> = sqlx::query_as(&format!(
            "SELECT {FIGMA_TEAM_COLUMNS} FROM figma_teams WHERE connect_installation_id = ?"
        ))
        .bind(connect_installation_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

pub struct SqliteAssociatedFigmaDesignRepository {
    pool: SqlitePool,
}

impl SqliteAssociatedFigmaDesignRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AssociatedFigmaDesignRepository for SqliteAssociatedFigmaDesignRepository {
    async fn upsert(
        &self,
        params: AssociatedFigmaDesignCreateParams,
    ) -> Result<AssociatedFigmaDesign, DbError> {
        let id = Uuid::new_v4().to_string();
        let node_id = params.node_id.clone().unwrap_or_default();
        sqlx::query(
            "INSERT INTO associated_figma_designs
                 (id, file_key, node_id, associated_with_ari, connect_installation_id)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(file_key, node_id, associated_with_ari, connect_installation_id)
                 DO NOTHING",
        )
        .bind(&id)
        .bind(&params.file_key)
        .bind(&node_id)
        .bind(&params.associated_with_ari)
        .bind(&params.connect_installation_id)
        .execute(&self.pool)
        .await?;

        let row: (String, String) = sqlx::query_as(
            "SELECT id, node_id FROM associated_figma_designs
             WHERE file_key = ? AND node_id = ? AND associated_with_ari = ?
               AND connect_installation_id = ?",
        )
        .bind(&params.file_key)
        .bind(&node_id)
        .bind(&params.associated_with_ari)
        .bind(&params.connect_installation_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(AssociatedFigmaDesign {
            id: row.0,
            file_key: params.file_key,
            node_id: params.node_id,
            associated_with_ari: params.associated_with_ari,
            connect_installation_id: params.connect_installation_id,
        })
    }

    async fn delete(&self, params: AssociatedFigmaDesignCreateParams) -> Result<(), DbError> {
        sqlx::query(
            "DELETE FROM associated_figma_designs
             WHERE file_key = ? AND node_id = ? AND associated_with_ari = ?
               AND connect_installation_id = ?",
        )
        .bind(&params.file_key)
        .bind(params.node_id.unwrap_or_default())
        .bind(&params.associated_with_ari)
        .bind(&params.connect_installation_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_many_by_file_key_and_installation_id(
        &self,
        file_key: &str,
        connect_installation_id: &str,
    ) -> Result<Vec<AssociatedFigmaDesign>, DbError> {
        // node_id is stored as '' for file-level associations.
        let rows: Vec<(String, String, String, String, String)> = sqlx::query_as(
            "SELECT id, file_key, node_id, associated_with_ari, connect_installation_id
             FROM associated_figma_designs
             WHERE file_key = ? AND connect_installation_id = ?",
        )
        .bind(file_key)
        .bind(connect_installation_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(
                |(id, file_key, node_id, associated_with_ari, connect_installation_id)| {
                    AssociatedFigmaDesign {
                        id,
                        file_key,
                        node_id: (!node_id.is_empty()).then_some(node_id),
                        associated_with_ari,
                        connect_installation_id,
                    }
                },
            )
            .collect())
    }
}
