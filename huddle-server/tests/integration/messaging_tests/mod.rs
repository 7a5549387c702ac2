mod test_chat_message_relayed;
