use axum::extract::ws::Message;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, warn};

use crate::captions::models::CaptionWsMessage;

/// Connection information for a live captioning client
#[derive(Debug, Clone)]
pub struct Connection {
    pub user_id: String,
    pub session_id: String,
    pub connection_id: String,
    pub connected_at: chrono::DateTime<chrono::Utc>,
    pub last_heartbeat: chrono::DateTime<chrono::Utc>,
}

/// Manages active caption WebSocket connections
///
/// Connections are keyed by session so a saved segment can be fanned out to
/// every client watching that session (the speaker's other tabs included).
#[derive(Clone)]
pub struct ConnectionManager {
    // Map of session_id -> list of connection_ids
    session_connections: Arc<RwLock<HashMap<String, Vec<String>>>>,
    // Map of connection_id -> sender channel
    connections: Arc<RwLock<HashMap<String, mpsc::UnboundedSender<Message>>>>,
    // Map of connection_id -> Connection info
    connection_info: Arc<RwLock<HashMap<String, Connection>>>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            session_connections: Arc::new(RwLock::new(HashMap::new())),
            connections: Arc::new(RwLock::new(HashMap::new())),
            connection_info: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register a new WebSocket connection
    pub async fn register(
        &self,
        user_id: String,
        session_id: String,
        connection_id: String,
        sender: mpsc::UnboundedSender<Message>,
    ) {
        let now = chrono::Utc::now();

        self.connections
            .write()
            .await
            .insert(connection_id.clone(), sender);

        let connection = Connection {
            user_id: user_id.clone(),
            session_id: session_id.clone(),
            connection_id: connection_id.clone(),
            connected_at: now,
            last_heartbeat: now,
        };
        self.connection_info
            .write()
            .await
            .insert(connection_id.clone(), connection);

        let mut session_conns = self.session_connections.write().await;
        session_conns
            .entry(session_id.clone())
            .or_insert_with(Vec::new)
            .push(connection_id.clone());

        info!(
            user_id = %user_id,
            session_id = %session_id,
            connection_id = %connection_id,
            "Caption WebSocket connection registered"
        );
    }

    /// Unregister a WebSocket connection
    pub async fn unregister(&self, connection_id: &str) {
        let conn_info = self.connection_info.write().await.remove(connection_id);

        if let Some(info) = conn_info {
            self.connections.write().await.remove(connection_id);

            let mut session_conns = self.session_connections.write().await;
            if let Some(conns) = session_conns.get_mut(&info.session_id) {
                conns.retain(|id| id != connection_id);
                if conns.is_empty() {
                    session_conns.remove(&info.session_id);
                }
            }

            info!(
                session_id = %info.session_id,
                connection_id = %connection_id,
                "Caption WebSocket connection unregistered"
            );
        }
    }

    /// Update heartbeat timestamp for a connection
    pub async fn update_heartbeat(&self, connection_id: &str) {
        if let Some(conn) = self.connection_info.write().await.get_mut(connection_id) {
            conn.last_heartbeat = chrono::Utc::now();
            debug!(connection_id = %connection_id, "Heartbeat updated");
        }
    }

    /// Get all connection IDs attached to a session
    pub async fn get_session_connections(&self, session_id: &str) -> Vec<String> {
        self.session_connections
            .read()
            .await
            .get(session_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Send a message to a specific connection
    pub async fn send_to_connection(
        &self,
        connection_id: &str,
        message: CaptionWsMessage,
    ) -> Result<(), String> {
        let json = serde_json::to_string(&message)
            .map_err(|e| format!("Failed to serialize message: {}", e))?;

        let connections = self.connections.read().await;
        if let Some(sender) = connections.get(connection_id) {
            sender
                .send(Message::Text(json))
                .map_err(|e| format!("Failed to send message: {}", e))?;
            Ok(())
        } else {
            Err(format!("Connection {} not found", connection_id))
        }
    }

    /// Send a message to every connection attached to a session
    pub async fn send_to_session(
        &self,
        session_id: &str,
        message: CaptionWsMessage,
    ) -> Result<usize, String> {
        let connection_ids = self.get_session_connections(session_id).await;
        let mut sent_count = 0;

        for conn_id in connection_ids {
            if self
                .send_to_connection(&conn_id, message.clone())
                .await
                .is_ok()
            {
                sent_count += 1;
            }
        }

        if sent_count > 0 {
            debug!(
                session_id = %session_id,
                sent_count = sent_count,
                "Message sent to session connections"
            );
            Ok(sent_count)
        } else {
            Err(format!("No active connections for session {}", session_id))
        }
    }

    /// Remove stale connections (no heartbeat for more than 60 seconds)
    pub async fn cleanup_stale_connections(&self) {
        let now = chrono::Utc::now();
        let timeout = chrono::Duration::seconds(60);

        let stale_connections: Vec<String> = self
            .connection_info
            .read()
            .await
            .iter()
            .filter(|(_, conn)| now.signed_duration_since(conn.last_heartbeat) > timeout)
            .map(|(id, _)| id.clone())
            .collect();

        for conn_id in stale_connections {
            warn!(connection_id = %conn_id, "Removing stale connection");
            self.unregister(&conn_id).await;
        }
    }

    /// Get total connection count
    pub async fn get_total_connections(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Start background task for cleaning up stale connections
    pub fn start_cleanup_task(manager: ConnectionManager) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(30));
            loop {
                interval.tick().await;
                manager.cleanup_stale_connections().await;
            }
        });
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_register_and_unregister() {
        let manager = ConnectionManager::new();
        let (tx, _rx) = mpsc::unbounded_channel();

        manager
            .register(
                "user-1".to_string(),
                "C_AAAAAA".to_string(),
                "N_111111".to_string(),
                tx,
            )
            .await;

        assert_eq!(manager.get_total_connections().await, 1);
        assert_eq!(
            manager.get_session_connections("C_AAAAAA").await,
            vec!["N_111111".to_string()]
        );

        manager.unregister("N_111111").await;
        assert_eq!(manager.get_total_connections().await, 0);
        assert!(manager.get_session_connections("C_AAAAAA").await.is_empty());
    }

    #[tokio::test]
    async fn test_send_to_session_fans_out() {
        let manager = ConnectionManager::new();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();

        manager
            .register(
                "user-1".to_string(),
                "C_AAAAAA".to_string(),
                "N_111111".to_string(),
                tx1,
            )
            .await;
        manager
            .register(
                "user-2".to_string(),
                "C_AAAAAA".to_string(),
                "N_222222".to_string(),
                tx2,
            )
            .await;

        let sent = manager
            .send_to_session("C_AAAAAA", CaptionWsMessage::Pong)
            .await
            .unwrap();
        assert_eq!(sent, 2);
        assert!(rx1.recv().await.is_some());
        assert!(rx2.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_send_to_unknown_session_errors() {
        let manager = ConnectionManager::new();
        let result = manager
            .send_to_session("C_MISSING", CaptionWsMessage::Pong)
            .await;
        assert!(result.is_err());
    }
}
