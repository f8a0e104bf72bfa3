use std::sync::Arc;

use axum::{
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::Response,
};
use futures_util::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use tracing::{debug, warn};

use crate::{
    dto::{PositionUpdateDto, SubscribeDto},
    hub::{Mailbox, ObserverId},
    state::AppState,
};

pub async fn live(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| handle(socket, state))
}

async fn handle(socket: WebSocket, state: Arc<AppState>) {
    let (id, mailbox) = state.hub.connect();
    debug!("observer {id} connected");

    let (sender, receiver) = socket.split();
    let mut send_task = tokio::spawn(forward(sender, mailbox));
    let mut recv_task = tokio::spawn(listen(receiver, state.clone(), id));

    // Either side ending tears the whole connection down.
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }
    state.hub.disconnect(id);
    debug!("observer {id} disconnected");
}

/// Drains the observer's mailbox onto the socket. The mailbox is bounded
/// and rolls old updates off on overflow, so a slow socket only ever sees
/// its own feed degrade.
async fn forward(mut sender: SplitSink<WebSocket, Message>, mailbox: Arc<Mailbox>) {
    loop {
        while let Some(event) = mailbox.pop() {
            let update = PositionUpdateDto::from(&event);
            let text = match serde_json::to_string(&update) {
                Ok(text) => text,
                Err(err) => {
                    warn!("failed to encode position update: {err}");
                    continue;
                }
            };
            if sender.send(Message::Text(text.into())).await.is_err() {
                return;
            }
        }
        if mailbox.is_closed() {
            return;
        }
        mailbox.wait().await;
    }
}

/// Handles subscribe messages; the latest filter always wins.
async fn listen(mut receiver: SplitStream<WebSocket>, state: Arc<AppState>, id: ObserverId) {
    while let Some(Ok(message)) = receiver.next().await {
        let Message::Text(text) = message else {
            continue;
        };
        match serde_json::from_str::<SubscribeDto>(&text) {
            Ok(subscribe) => match subscribe.filter.into_filter() {
                Ok(filter) => {
                    state.hub.subscribe(id, filter);
                }
                Err(err) => warn!("observer {id}: {err}"),
            },
            Err(err) => warn!("observer {id} sent an unreadable subscribe: {err}"),
        }
    }
}
