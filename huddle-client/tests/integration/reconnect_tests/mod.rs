mod test_queue_purged_on_reconnect;
