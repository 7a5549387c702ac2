mod test_chat_messages;
