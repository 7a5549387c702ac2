mod test_candidates_before_answer;
mod test_end_to_end_negotiation;
