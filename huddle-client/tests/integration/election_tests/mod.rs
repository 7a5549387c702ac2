mod test_one_link_per_pair;
