// Lock-free single-producer single-consumer channels

use crate::messaging::command::EditorMessage;
use crate::messaging::notification::Notification;
use ringbuf::{HeapRb, traits::Split};

pub type MessageProducer = ringbuf::HeapProd<EditorMessage>;
pub type MessageConsumer = ringbuf::HeapCons<EditorMessage>;

/// Queue of edits waiting to be applied by the editor, in arrival order
pub fn create_editor_channel(capacity: usize) -> (MessageProducer, MessageConsumer) {
    let rb = HeapRb::<EditorMessage>::new(capacity);
    rb.split()
}

pub type NotificationProducer = ringbuf::HeapProd<Notification>;
pub type NotificationConsumer = ringbuf::HeapCons<Notification>;

pub fn create_notification_channel(
    capacity: usize,
) -> (NotificationProducer, NotificationConsumer) {
    let rb = HeapRb::<Notification>::new(capacity);
    rb.split()
}
